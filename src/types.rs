use crate::config::Config;
use crate::store::CallStore;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
    // number => call uuid
    pub store: Arc<dyn CallStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn CallStore>) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            store,
        }
    }
}

/// JSON body returned by the browser-facing endpoints.
#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum ApiResponse {
    Success { success: bool },
    Error { error: String },
}

impl ApiResponse {
    pub fn success() -> Self {
        ApiResponse::Success { success: true }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        ApiResponse::Error { error: msg.into() }
    }
}

/// Pub/sub events understood by the browser client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastEvent {
    InCall,
    ShowTalking,
    ShowMembers,
}

impl BroadcastEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BroadcastEvent::InCall => "in_call",
            BroadcastEvent::ShowTalking => "show_talking",
            BroadcastEvent::ShowMembers => "show_members",
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CallParams {
    pub number_call: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct PlayParams {
    pub call_uuid: Option<String>,
    /// Looked up in the call store when `call_uuid` is absent
    pub number: Option<String>,
    pub tts_msg: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ConferenceParams {
    pub number: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct MembersParams {
    #[serde(rename = "Room")]
    pub room: Option<String>,
}
