use crate::consts::{
    DEFAULT_CONFERENCE_NAME, DEFAULT_PLIVO_API_URL, DEFAULT_PLIVO_MUSIC, DEFAULT_PORT,
    DEFAULT_PUSHER_CHANNEL, DEFAULT_PUSHER_CLUSTER, DEFAULT_REDIS_URL,
};
use crate::error::AppError;

use std::env;

/// Everything the handlers need to know about the outside world.
#[derive(Clone, Debug)]
pub struct Config {
    pub plivo_auth_id: String,
    pub plivo_auth_token: String,
    /// Caller id used for every outbound call
    pub plivo_number: String,
    pub plivo_api_url: String,
    pub plivo_music: String,
    pub pusher_app_id: String,
    pub pusher_key: String,
    pub pusher_secret: String,
    pub pusher_cluster: String,
    pub pusher_api_url: String,
    pub pusher_channel: String,
    /// Public address of this service, always ending in `/`
    pub base_url: String,
    pub redis_url: String,
    pub conference_name: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        // A missing .env file is fine; the variables may come from the real environment.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config(format!("{key} not set!")))
        };
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let mut base_url = required("BASE_URL")?;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let pusher_cluster = or_default("PUSHER_CLUSTER", DEFAULT_PUSHER_CLUSTER);
        let pusher_api_url = match lookup("PUSHER_API_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://api-{pusher_cluster}.pusher.com"),
        };
        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {port}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            plivo_auth_id: required("PLIVO_AUTH_ID")?,
            plivo_auth_token: required("PLIVO_AUTH_TOKEN")?,
            plivo_number: required("PLIVO_NUMBER")?,
            plivo_api_url: or_default("PLIVO_API_URL", DEFAULT_PLIVO_API_URL)
                .trim_end_matches('/')
                .to_string(),
            plivo_music: or_default("PLIVO_MUSIC", DEFAULT_PLIVO_MUSIC),
            pusher_app_id: required("PUSHER_APP_ID")?,
            pusher_key: required("PUSHER_KEY")?,
            pusher_secret: required("PUSHER_SECRET")?,
            pusher_cluster,
            pusher_api_url,
            pusher_channel: or_default("PUSHER_CHANNEL", DEFAULT_PUSHER_CHANNEL),
            base_url,
            redis_url: or_default("REDISTOGO_URL", DEFAULT_REDIS_URL),
            conference_name: or_default("CONFERENCE_NAME", DEFAULT_CONFERENCE_NAME),
            port,
        })
    }

    /// Absolute URL of one of our own webhook paths.
    pub fn callback_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
