//! Endpoints and tuning knobs for the YouTube client
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Client version sent when the home page doesn't expose one
pub const DEFAULT_CLIENT_VERSION: &str = "2.20240101.00.00";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: Url,
    pub default_client_version: String,
    /// Numeric client id; "1" is the desktop web client
    pub client_name: String,
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl ClientConfig {
    pub fn home_url(&self) -> Url {
        self.base_url.clone()
    }

    /// History feed as JSON (`pbj=1` switches the page to its JSON payload)
    pub fn history_feed_url(&self) -> Url {
        let mut url = self.history_page_url();
        url.query_pairs_mut().append_pair("pbj", "1");
        url
    }

    pub fn history_page_url(&self) -> Url {
        self.join("feed/history")
    }

    pub fn feedback_url(&self) -> Url {
        let mut url = self.join("service_ajax");
        url.query_pairs_mut().append_pair("name", "feedbackEndpoint");
        url
    }

    fn join(&self, path: &str) -> Url {
        // Relative paths without a scheme always join onto an http(s) base
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: Url::parse("https://www.youtube.com/").expect("static base URL is valid"),
            default_client_version: DEFAULT_CLIENT_VERSION.to_string(),
            client_name: "1".to_string(),
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: 30,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
