//! YouTube watch-history client
//!
//! Flow:
//! 1. `bootstrap` scrapes session tokens from the home page
//! 2. `history_state` reads the history feed and caches what it found
//! 3. `toggle` posts the cached action back and invalidates the cache
//! 4. `confirm_state` re-reads the feed until YouTube reports the new state
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::feed::{HistoryState, parse_history_feed};
use crate::tokens::SessionTokens;
use crate::transport::{Headers, Transport};
use serde::Deserialize;
use std::cell::RefCell;
use std::future::Future;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct FeedbackResponse {
    code: Option<String>,
}

const SUCCESS_CODE: &str = "SUCCESS";

#[derive(Debug)]
pub struct YoutubeClient<T> {
    transport: T,
    config: ClientConfig,
    tokens: SessionTokens,
    cache: RefCell<Option<HistoryState>>,
}

impl<T: Transport> YoutubeClient<T> {
    pub fn new(transport: T, config: ClientConfig, tokens: SessionTokens) -> YoutubeClient<T> {
        YoutubeClient {
            transport,
            config,
            tokens,
            cache: RefCell::new(None),
        }
    }

    /// Fetch the home page and build a client from the tokens on it
    pub async fn bootstrap(transport: T, config: ClientConfig) -> Result<YoutubeClient<T>, ClientError> {
        let html = transport.get(config.home_url(), Vec::new()).await?;
        let tokens = SessionTokens::scrape(&html, &config.default_client_version);
        log::info!(
            "bootstrapped client version {} ({})",
            tokens.client_version,
            if tokens.id_token.is_some() { "signed in" } else { "anonymous" }
        );
        Ok(YoutubeClient::new(transport, config, tokens))
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    pub fn history_page_url(&self) -> Url {
        self.config.history_page_url()
    }

    /// Headers every YouTube request carries
    pub fn auth_headers(&self) -> Headers {
        let mut headers = vec![
            ("x-youtube-client-version", self.tokens.client_version.clone()),
            ("x-youtube-client-name", self.config.client_name.clone()),
        ];
        if let Some(id_token) = &self.tokens.id_token {
            headers.push(("x-youtube-identity-token", id_token.clone()));
        }
        headers
    }

    pub fn cached_state(&self) -> Option<HistoryState> {
        self.cache.borrow().clone()
    }

    pub fn invalidate(&self) {
        *self.cache.borrow_mut() = None;
    }

    /// Current recording state, from cache when available
    pub async fn history_state(&self) -> Result<HistoryState, ClientError> {
        if let Some(state) = self.cached_state() {
            return Ok(state);
        }

        let body = self
            .transport
            .get(self.config.history_feed_url(), self.auth_headers())
            .await?;
        let state = parse_history_feed(&body)?;
        log::debug!("history recording is {}", if state.recording { "on" } else { "off" });

        *self.cache.borrow_mut() = Some(state.clone());
        Ok(state)
    }

    /// Flip recording and return the state YouTube should now report.
    /// The change is not visible immediately; see `confirm_state`.
    pub async fn toggle(&self) -> Result<bool, ClientError> {
        let state = self.history_state().await?;
        let secrets = &state.secrets;

        let form = [
            ("sej", secrets.sej.to_string()),
            ("csn", secrets.csn.clone()),
            ("session_token", secrets.session_token.clone()),
        ];
        let body = self
            .transport
            .post_form(self.config.feedback_url(), self.auth_headers(), &form)
            .await?;

        let response: FeedbackResponse = serde_json::from_str(&body)?;
        if response.code.as_deref() != Some(SUCCESS_CODE) {
            log::warn!("feedback endpoint answered {:?}", response.code);
            return Err(ClientError::ToggleRejected(response.code));
        }

        self.invalidate();
        let expected = !state.recording;
        log::info!("toggle accepted, expecting history {}", if expected { "on" } else { "off" });
        Ok(expected)
    }

    /// Re-read the feed until it reports `expected`, pausing between reads
    pub async fn confirm_state<S, F>(&self, expected: bool, mut sleep: S) -> Result<HistoryState, ClientError>
    where
        S: FnMut(Duration) -> F,
        F: Future<Output = ()>,
    {
        let attempts = self.config.max_poll_attempts.max(1);
        for attempt in 1..=attempts {
            let state = self.history_state().await?;
            if state.recording == expected {
                log::debug!("state confirmed after {} check(s)", attempt);
                return Ok(state);
            }

            self.invalidate();
            if attempt < attempts {
                sleep(self.config.poll_interval).await;
            }
        }

        Err(ClientError::ConfirmTimeout { expected, attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::tests::feed_recording;
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq)]
    struct Recorded {
        method: &'static str,
        url: String,
        headers: Headers,
        form: Vec<(String, String)>,
    }

    /// Replays canned bodies in order and records every request
    #[derive(Default)]
    struct FakeTransport {
        responses: RefCell<VecDeque<Result<String, ClientError>>>,
        requests: RefCell<Vec<Recorded>>,
    }

    impl FakeTransport {
        fn with(responses: Vec<&str>) -> FakeTransport {
            let fake = FakeTransport::default();
            for body in responses {
                fake.push(body);
            }
            fake
        }

        fn push(&self, body: &str) {
            self.responses.borrow_mut().push_back(Ok(body.to_string()));
        }

        fn next(&self, recorded: Recorded) -> Result<String, ClientError> {
            self.requests.borrow_mut().push(recorded);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Transport("no canned response".to_string())))
        }

        fn requests(&self) -> Vec<Recorded> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for FakeTransport {
        async fn get(&self, url: Url, headers: Headers) -> Result<String, ClientError> {
            self.next(Recorded {
                method: "GET",
                url: url.to_string(),
                headers,
                form: Vec::new(),
            })
        }

        async fn post_form(
            &self,
            url: Url,
            headers: Headers,
            form: &[(&str, String)],
        ) -> Result<String, ClientError> {
            self.next(Recorded {
                method: "POST",
                url: url.to_string(),
                headers,
                form: form.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            })
        }
    }

    const HOME_PAGE: &str = r#"{"ID_TOKEN":"id-tok","INNERTUBE_CONTEXT_CLIENT_VERSION":"2.2020"}"#;
    const SUCCESS: &str = r#"{"code":"SUCCESS","data":{}}"#;

    fn client_with(responses: Vec<&str>) -> YoutubeClient<FakeTransport> {
        let config = ClientConfig {
            max_poll_attempts: 5,
            ..ClientConfig::default()
        };
        let mut all = vec![HOME_PAGE];
        all.extend(responses);
        block_on(YoutubeClient::bootstrap(FakeTransport::with(all), config)).unwrap()
    }

    async fn no_sleep(_: Duration) {}

    #[test]
    fn test_bootstrap_reads_home_page_without_auth() {
        let client = client_with(vec![]);
        let requests = client.transport.requests();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://www.youtube.com/");
        assert!(requests[0].headers.is_empty());
        assert_eq!(client.tokens().id_token.as_deref(), Some("id-tok"));
        assert_eq!(client.tokens().client_version, "2.2020");
    }

    #[test]
    fn test_auth_headers() {
        let client = client_with(vec![]);

        assert_eq!(
            client.auth_headers(),
            vec![
                ("x-youtube-client-version", "2.2020".to_string()),
                ("x-youtube-client-name", "1".to_string()),
                ("x-youtube-identity-token", "id-tok".to_string()),
            ]
        );
    }

    #[test]
    fn test_auth_headers_without_identity() {
        let tokens = SessionTokens {
            id_token: None,
            client_version: "2.1".to_string(),
        };
        let client = YoutubeClient::new(FakeTransport::default(), ClientConfig::default(), tokens);

        let headers = client.auth_headers();
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|(name, _)| *name != "x-youtube-identity-token"));
    }

    #[test]
    fn test_history_state_is_cached() {
        let client = client_with(vec![feed_recording(true).as_str()]);

        let first = block_on(client.history_state()).unwrap();
        let second = block_on(client.history_state()).unwrap();

        assert!(first.recording);
        assert_eq!(first, second);
        // home page + one feed fetch
        assert_eq!(client.transport.requests().len(), 2);
        let feed_request = &client.transport.requests()[1];
        assert_eq!(feed_request.url, "https://www.youtube.com/feed/history?pbj=1");
        assert_eq!(feed_request.headers, client.auth_headers());
    }

    #[test]
    fn test_invalidate_forces_refetch() {
        let client = client_with(vec![feed_recording(true).as_str(), feed_recording(false).as_str()]);

        assert!(block_on(client.history_state()).unwrap().recording);
        client.invalidate();
        assert!(client.cached_state().is_none());
        assert!(!block_on(client.history_state()).unwrap().recording);
    }

    #[test]
    fn test_toggle_posts_secrets() {
        let client = client_with(vec![feed_recording(true).as_str(), SUCCESS]);

        let expected = block_on(client.toggle()).unwrap();

        assert!(!expected);
        assert!(client.cached_state().is_none());

        let requests = client.transport.requests();
        let post = requests.last().unwrap();
        assert_eq!(post.method, "POST");
        assert_eq!(post.url, "https://www.youtube.com/service_ajax?name=feedbackEndpoint");
        assert_eq!(post.headers, client.auth_headers());
        assert_eq!(post.form[0].0, "sej");
        let sej: serde_json::Value = serde_json::from_str(&post.form[0].1).unwrap();
        assert_eq!(sej["feedbackEndpoint"]["feedbackToken"], "pause-token");
        assert_eq!(post.form[1], ("csn".to_string(), "csn-123".to_string()));
        assert_eq!(post.form[2], ("session_token".to_string(), "xsrf-456".to_string()));
    }

    #[test]
    fn test_toggle_uses_cached_state() {
        let client = client_with(vec![feed_recording(false).as_str(), SUCCESS]);

        block_on(client.history_state()).unwrap();
        let expected = block_on(client.toggle()).unwrap();

        assert!(expected);
        // home, feed, post: no second feed read
        assert_eq!(client.transport.requests().len(), 3);
    }

    #[test]
    fn test_toggle_rejected_keeps_cache() {
        let client = client_with(vec![feed_recording(true).as_str(), r#"{"code":"FAILURE"}"#]);

        let result = block_on(client.toggle());

        assert!(matches!(result, Err(ClientError::ToggleRejected(Some(code))) if code == "FAILURE"));
        assert!(client.cached_state().is_some());
    }

    #[test]
    fn test_toggle_response_without_code() {
        let client = client_with(vec![feed_recording(true).as_str(), "{}"]);

        assert!(matches!(block_on(client.toggle()), Err(ClientError::ToggleRejected(None))));
    }

    #[test]
    fn test_confirm_polls_until_state_flips() {
        let client = client_with(vec![
            feed_recording(true).as_str(),
            SUCCESS,
            feed_recording(true).as_str(),
            feed_recording(true).as_str(),
            feed_recording(false).as_str(),
        ]);
        let sleeps = Cell::new(0);

        let expected = block_on(client.toggle()).unwrap();
        let state = block_on(client.confirm_state(expected, |interval| {
            assert_eq!(interval, Duration::from_secs(1));
            sleeps.set(sleeps.get() + 1);
            no_sleep(interval)
        }))
        .unwrap();

        assert!(!state.recording);
        assert_eq!(sleeps.get(), 2);
        assert_eq!(client.cached_state(), Some(state));
    }

    #[test]
    fn test_confirm_gives_up() {
        let stale = feed_recording(true);
        let client = client_with(vec![stale.as_str(); 5]);

        let result = block_on(client.confirm_state(false, no_sleep));

        assert!(matches!(
            result,
            Err(ClientError::ConfirmTimeout { expected: false, attempts: 5 })
        ));
        // home page + five feed reads
        assert_eq!(client.transport.requests().len(), 6);
    }

    #[test]
    fn test_confirm_propagates_fetch_errors() {
        let client = client_with(vec![]);

        let result = block_on(client.confirm_state(true, no_sleep));

        assert!(matches!(result, Err(ClientError::Transport(_))));
    }
}
