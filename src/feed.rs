//! History feed payload: renderer types and the pause/resume lookup
use crate::error::ClientError;
use serde::Deserialize;
use serde_json::Value;

const SIDEBAR_PATH: &str = "/1/response/contents/twoColumnBrowseResultsRenderer/secondaryContents/browseFeedActionsRenderer/contents";
const CSN_PATH: &str = "/0/csn";
const XSRF_PATH: &str = "/1/xsrf_token";

const PAUSE_LABEL: &str = "Pause";
const TURN_ON_LABEL: &str = "Turn on";

/// One entry of the history page sidebar. Only buttons matter here;
/// the search box and sub-feed selector are skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarItem {
    pub button_renderer: Option<ButtonRenderer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonRenderer {
    pub text: Option<Text>,
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Text {
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextRun {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEndpoint {
    pub confirm_dialog_endpoint: Option<ConfirmDialogEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmDialogEndpoint {
    pub content: ConfirmDialogContent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDialogContent {
    pub confirm_dialog_renderer: ConfirmDialogRenderer,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDialogRenderer {
    /// Posted back untouched, so it stays raw JSON
    pub confirm_endpoint: Option<Value>,
}

impl ButtonRenderer {
    fn label(&self) -> Option<&str> {
        self.text
            .as_ref()
            .and_then(|text| text.runs.first())
            .map(|run| run.text.as_str())
    }

    fn confirm_endpoint(&self) -> Option<&Value> {
        self.navigation_endpoint
            .as_ref()?
            .confirm_dialog_endpoint
            .as_ref()?
            .content
            .confirm_dialog_renderer
            .confirm_endpoint
            .as_ref()
    }
}

/// Short-lived values needed to invoke the toggle action
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleSecrets {
    pub sej: Value,
    pub csn: String,
    pub session_token: String,
}

/// Recording status as seen on the history page
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryState {
    pub recording: bool,
    pub secrets: ToggleSecrets,
}

/// Parse the `feed/history?pbj=1` body into the current recording state
pub fn parse_history_feed(body: &str) -> Result<HistoryState, ClientError> {
    let feed: Value = serde_json::from_str(body)?;

    let sidebar = feed
        .pointer(SIDEBAR_PATH)
        .ok_or(ClientError::FeedShape(SIDEBAR_PATH))?;
    let items = sidebar_items(sidebar)?;

    let (recording, button) = find_history_action(&items).ok_or(ClientError::NoHistoryAction)?;

    let sej = button
        .confirm_endpoint()
        .cloned()
        .ok_or(ClientError::MissingSecret("confirm endpoint"))?;
    let csn = string_at(&feed, CSN_PATH).ok_or(ClientError::MissingSecret("csn"))?;
    let session_token = string_at(&feed, XSRF_PATH).ok_or(ClientError::MissingSecret("xsrf token"))?;

    Ok(HistoryState {
        recording,
        secrets: ToggleSecrets {
            sej,
            csn,
            session_token,
        },
    })
}

/// Each entry is read on its own; entries whose shape doesn't fit are
/// skipped so an unrelated sidebar widget can't break the lookup.
fn sidebar_items(sidebar: &Value) -> Result<Vec<SidebarItem>, ClientError> {
    let entries = sidebar
        .as_array()
        .ok_or(ClientError::FeedShape(SIDEBAR_PATH))?;

    Ok(entries
        .iter()
        .filter_map(|entry| match SidebarItem::deserialize(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                log::debug!("skipping sidebar entry: {}", e);
                None
            }
        })
        .collect())
}

/// A "Pause" button means history is on; "Turn on" means it is off.
///
/// If both show up, the pause button wins and its endpoint is the one
/// posted. Posting the "Turn on" endpoint while reporting ON would be a
/// no-op, and the confirm loop would never see the state flip.
fn find_history_action(items: &[SidebarItem]) -> Option<(bool, &ButtonRenderer)> {
    let find = |needle: &str| {
        items
            .iter()
            .filter_map(|item| item.button_renderer.as_ref())
            .find(|button| button.label().is_some_and(|label| label.contains(needle)))
    };

    find(PAUSE_LABEL)
        .map(|button| (true, button))
        .or_else(|| find(TURN_ON_LABEL).map(|button| (false, button)))
}

fn string_at(feed: &Value, path: &str) -> Option<String> {
    feed.pointer(path).and_then(Value::as_str).map(str::to_string)
}
