//! Reusable UI components

use yew::prelude::*;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum HistoryStatus {
    Loading,
    On,
    Off,
    Error,
}

impl HistoryStatus {
    pub fn from_recording(recording: bool) -> HistoryStatus {
        if recording {
            HistoryStatus::On
        } else {
            HistoryStatus::Off
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryStatus::Loading => "Loading...",
            HistoryStatus::On => "ON",
            HistoryStatus::Off => "OFF",
            HistoryStatus::Error => "Error",
        }
    }

    fn class(&self) -> &'static str {
        match self {
            HistoryStatus::Loading => "status-loading",
            HistoryStatus::On => "status-on",
            HistoryStatus::Off => "status-off",
            HistoryStatus::Error => "status-error",
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusLabelProps {
    pub status: HistoryStatus,
    #[prop_or(false)]
    pub busy: bool,
}

#[function_component(StatusLabel)]
pub fn status_label(props: &StatusLabelProps) -> Html {
    let classes = classes!(
        "history-status",
        props.status.class(),
        (props.busy || props.status == HistoryStatus::Loading).then_some("loading"),
    );

    html! {
        <div class="status-row">
            <span class="status-caption">{"Watch history: "}</span>
            <span id="historyStatus" class={classes}>{props.status.label()}</span>
        </div>
    }
}
