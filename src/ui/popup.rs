//! Popup UI for the History Toggle extension

use std::rc::Rc;
use yew::prelude::*;
use yew::platform::time::sleep;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use patternfly_yew::prelude::*;
use serde::Serialize;
use crate::client::YoutubeClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::FetchTransport;
use crate::ui::components::{HistoryStatus, StatusLabel};

// Import JS bridge functions
#[wasm_bindgen(module = "/popup.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn openTab(properties: JsValue) -> Result<(), JsValue>;
}

type Client = Rc<YoutubeClient<FetchTransport>>;

/// Subset of chrome.tabs.create() properties
#[derive(Serialize)]
struct CreateTabProperties {
    url: String,
    active: bool,
}

#[function_component(App)]
pub fn app() -> Html {
    let client = use_state(|| None::<Client>);
    let status = use_state(|| HistoryStatus::Loading);
    let busy = use_state(|| false);
    let error = use_state(|| None::<String>);

    // Bootstrap the client and prefetch the history state on mount
    {
        let client = client.clone();
        let status = status.clone();
        let error = error.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match connect().await {
                    Ok(connected) => {
                        status.set(refresh_status(&connected).await);
                        client.set(Some(connected));
                    }
                    Err(e) => {
                        log::error!("failed to start client: {}", e);
                        status.set(HistoryStatus::Error);
                        error.set(Some(e.to_string()));
                    }
                }
            });
            || ()
        });
    }

    let on_toggle = {
        let client = client.clone();
        let status = status.clone();
        let busy = busy.clone();
        let error = error.clone();

        Callback::from(move |_| {
            let Some(client) = (*client).clone() else {
                return;
            };
            if *busy {
                return;
            }

            let status = status.clone();
            let busy = busy.clone();
            let error = error.clone();

            busy.set(true);
            error.set(None);

            spawn_local(async move {
                match toggle_and_confirm(&client).await {
                    Ok(recording) => {
                        status.set(HistoryStatus::from_recording(recording));
                    }
                    Err(e) => {
                        log::error!("toggle failed: {}", e);
                        error.set(Some(e.to_string()));
                        status.set(refresh_status(&client).await);
                    }
                }
                busy.set(false);
            });
        })
    };

    let on_open_history = {
        let client = client.clone();

        Callback::from(move |_| {
            let url = match &*client {
                Some(client) => client.history_page_url(),
                None => ClientConfig::default().history_page_url(),
            };
            spawn_local(async move {
                if let Err(e) = open_tab(url.to_string()).await {
                    log::error!("{}", e);
                }
            });
        })
    };

    let toggle_disabled = *busy || client.is_none();
    let toggle_label = match *status {
        HistoryStatus::On => "Pause history",
        HistoryStatus::Off => "Turn on history",
        _ => "Toggle history",
    };

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"History Toggle"}</h1>

            <StatusLabel status={*status} busy={*busy} />

            <div class={classes!("flex-column-gap", busy.then_some("loading"))}>
                <Button
                    onclick={on_toggle}
                    disabled={toggle_disabled}
                    variant={ButtonVariant::Primary}
                    block={true}
                >
                    {toggle_label}
                </Button>
                <Button onclick={on_open_history} variant={ButtonVariant::Secondary} block={true}>
                    {"Open watch history"}
                </Button>
            </div>

            if *busy {
                <div class="loading-text-center">
                    <Spinner />
                    <p class="loading-text">{"Waiting for YouTube to confirm..."}</p>
                </div>
            }

            if let Some(err) = (*error).clone() {
                <div id="error" class="message-top-margin">
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err}
                    </Alert>
                </div>
            }
        </div>
    }
}

// Helper functions

async fn connect() -> Result<Client, ClientError> {
    let client = YoutubeClient::bootstrap(FetchTransport::new(), ClientConfig::default()).await?;
    Ok(Rc::new(client))
}

async fn refresh_status(client: &Client) -> HistoryStatus {
    match client.history_state().await {
        Ok(state) => HistoryStatus::from_recording(state.recording),
        Err(e) => {
            log::warn!("could not read history state: {}", e);
            HistoryStatus::Error
        }
    }
}

async fn toggle_and_confirm(client: &Client) -> Result<bool, ClientError> {
    let expected = client.toggle().await?;
    let state = client.confirm_state(expected, sleep).await?;
    Ok(state.recording)
}

async fn open_tab(url: String) -> Result<(), String> {
    let properties = serde_wasm_bindgen::to_value(&CreateTabProperties { url, active: true })
        .map_err(|e| format!("Failed to serialize: {:?}", e))?;

    openTab(properties)
        .await
        .map_err(|e| format!("Failed to open tab: {:?}", e))
}
