//! Errors raised while talking to YouTube's private endpoints

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("response was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected feed shape: nothing at {0}")]
    FeedShape(&'static str),
    #[error("no pause or resume button found in the history sidebar")]
    NoHistoryAction,
    #[error("history action has no {0}")]
    MissingSecret(&'static str),
    #[error("toggling failed (response code {0:?})")]
    ToggleRejected(Option<String>),
    #[error("history did not switch {} after {attempts} checks", on_off(.expected))]
    ConfirmTimeout { expected: bool, attempts: u32 },
}

fn on_off(value: &bool) -> &'static str {
    if *value { "on" } else { "off" }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
