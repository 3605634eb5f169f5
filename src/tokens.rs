//! Session tokens scraped from the YouTube home page
use regex::Regex;
use std::sync::LazyLock;

static ID_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""ID_TOKEN":"([^"]+)""#).expect("ID_TOKEN_REGEX should be valid"));
static CLIENT_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_CONTEXT_CLIENT_VERSION":"([^"]+)""#)
        .expect("CLIENT_VERSION_REGEX should be valid")
});

/// Identity and version values that authenticate every later request
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTokens {
    /// Absent when the user is signed out or the page layout changed
    pub id_token: Option<String>,
    pub client_version: String,
}

impl SessionTokens {
    /// Pull the tokens out of the home page's inline `ytcfg` blob
    ///
    /// The version falls back to `default_version` when the page has none.
    pub fn scrape(html: &str, default_version: &str) -> SessionTokens {
        let id_token = capture(&ID_TOKEN_REGEX, html).filter(|token| !token.is_empty());
        let client_version = capture(&CLIENT_VERSION_REGEX, html).unwrap_or_else(|| {
            log::warn!("client version not found on home page, using {}", default_version);
            default_version.to_string()
        });

        if id_token.is_none() {
            log::warn!("no identity token on home page; requests will be anonymous");
        }

        SessionTokens {
            id_token,
            client_version,
        }
    }
}

fn capture(regex: &Regex, html: &str) -> Option<String> {
    regex
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| unescape(m.as_str()))
}

/// Values sit inside a JS string literal, so `=` shows up as `\u003d`
fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME_PAGE: &str = r#"<script>ytcfg.set({"INNERTUBE_API_KEY":"abc","ID_TOKEN":"QUFFLUhq\u003d\u003d","INNERTUBE_CONTEXT_CLIENT_VERSION":"2.20191008.04.01","LOGGED_IN":true});</script>"#;

    #[test]
    fn test_scrape_both_tokens() {
        let tokens = SessionTokens::scrape(HOME_PAGE, "fallback");

        assert_eq!(tokens.id_token, Some("QUFFLUhq==".to_string()));
        assert_eq!(tokens.client_version, "2.20191008.04.01");
    }

    #[test]
    fn test_missing_version_uses_default() {
        let html = r#"{"ID_TOKEN":"token123"}"#;
        let tokens = SessionTokens::scrape(html, "2.0.default");

        assert_eq!(tokens.id_token, Some("token123".to_string()));
        assert_eq!(tokens.client_version, "2.0.default");
    }

    #[test]
    fn test_signed_out_page_has_no_identity() {
        let html = r#"{"INNERTUBE_CONTEXT_CLIENT_VERSION":"2.1"}"#;
        let tokens = SessionTokens::scrape(html, "fallback");

        assert_eq!(tokens.id_token, None);
        assert_eq!(tokens.client_version, "2.1");
    }

    #[test]
    fn test_empty_page() {
        let tokens = SessionTokens::scrape("", "fallback");

        assert_eq!(tokens.id_token, None);
        assert_eq!(tokens.client_version, "fallback");
    }

    #[test]
    fn test_unescape_keeps_broken_escapes_raw() {
        assert_eq!(unescape(r"abc\u00"), r"abc\u00");
        assert_eq!(unescape("plain"), "plain");
        assert_eq!(unescape(r"a\/b"), "a/b");
    }
}
