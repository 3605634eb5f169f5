//! History Toggle - Chrome Extension for pausing YouTube watch history
//! Built with Rust + WASM + Yew

mod config;
mod error;
mod feed;
mod tokens;
mod transport;
pub mod client;
pub mod ui;

pub use client::YoutubeClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use feed::{HistoryState, ToggleSecrets};
pub use tokens::SessionTokens;
pub use transport::{FetchTransport, Headers, Transport};

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}
