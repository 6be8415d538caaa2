pub mod config;
pub mod error;
pub mod handlers;
pub mod plivo;
pub mod plivo_types;
pub mod pusher;
pub mod store;
pub mod types;
pub mod utils;

use crate::types::AppState;

use axum::{
    body::{Bytes, Full},
    http::{header, HeaderValue, Response, StatusCode},
    routing::get,
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;

pub mod consts {
    pub const DEFAULT_CONFERENCE_NAME: &str = "collaborate-io";
    pub const DEFAULT_PUSHER_CHANNEL: &str = "plivo-collaborate";
    pub const DEFAULT_PUSHER_CLUSTER: &str = "mt1";
    pub const DEFAULT_PLIVO_API_URL: &str = "https://api.plivo.com";
    pub const DEFAULT_PLIVO_MUSIC: &str = "http://s3.amazonaws.com/plivocloud/music.mp3";
    pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
    pub const DEFAULT_PORT: u16 = 5000;

    // Our own webhook paths, relative to BASE_URL.
    pub const RING_PATH: &str = "response/call/ring/";
    pub const CONFERENCE_ANSWER_PATH: &str = "response/conf/";
    pub const CONFERENCE_ACTION_PATH: &str = "response/conf/action/";
    pub const CONFERENCE_CALLBACK_PATH: &str = "response/conf/callback/";
    pub const MUSIC_PATH: &str = "response/conf/music/";

    pub const CONFERENCE_WELCOME: &str =
        "Welcome to the world of top class conferencing! You are being placed into a conference.";
    pub const MUSIC_LOOPS: u16 = 50;
    pub const CONFERENCE_ENTER: &str = "ConferenceEnter";
    pub const CONFERENCE_EXIT: &str = "ConferenceExit";
    pub const FLOOR_ACTION: &str = "floor";

    pub const NO_NUMBER: &str = "No number";
    pub const ALREADY_IN_CONFERENCE: &str = "Already in conference";
    pub const CALL_FAILED: &str = "Call cannot be established, please verify your number";
    pub const MEMBERSHIP_UNKNOWN: &str = "Unable to check conference members";
    pub const MEMBERS_UNAVAILABLE: &str = "Conference members unavailable";
    pub const BROADCAST_FAILED: &str = "Broadcast failed";
    pub const UNHANDLED_EVENT: &str = "Unhandled conference event";
    pub const BAD_REQUEST: &str = "Bad request";
}

const SERVER_ERROR_PAGE: &str = include_str!("../templates/custom_500.html");

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Full<Bytes>> {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    error!(details=%details, "handler panicked");

    let mut response = Response::new(Full::from(SERVER_ERROR_PAGE));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

pub fn app(app_state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/call/", get(handlers::call).post(handlers::call))
        .route(
            "/call/play/",
            get(handlers::call_play).post(handlers::call_play),
        )
        .route(
            "/response/call/ring/",
            get(handlers::call_ring).post(handlers::call_ring),
        )
        .route(
            "/conference/",
            get(handlers::conference).post(handlers::conference),
        )
        .route(
            "/conference/members/",
            get(handlers::conference_members).post(handlers::conference_members),
        )
        .route(
            "/response/conf/",
            get(handlers::conference_answer).post(handlers::conference_answer),
        )
        .route(
            "/response/conf/action/",
            get(handlers::conference_action).post(handlers::conference_action),
        )
        .route(
            "/response/conf/callback/",
            get(handlers::conference_callback).post(handlers::conference_callback),
        )
        .route(
            "/response/conf/music/",
            get(handlers::conference_music).post(handlers::conference_music),
        )
        .fallback(handlers::not_found);
    with_layers(router.with_state(app_state))
}

/// Request tracing and the 500 page, wrapped around a finished router.
pub fn with_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}
