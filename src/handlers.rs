use crate::consts::{
    ALREADY_IN_CONFERENCE, BAD_REQUEST, BROADCAST_FAILED, CALL_FAILED, CONFERENCE_ACTION_PATH,
    CONFERENCE_ANSWER_PATH, CONFERENCE_CALLBACK_PATH, CONFERENCE_ENTER, CONFERENCE_EXIT,
    CONFERENCE_WELCOME, FLOOR_ACTION, MEMBERSHIP_UNKNOWN, MEMBERS_UNAVAILABLE, MUSIC_LOOPS,
    MUSIC_PATH, NO_NUMBER, RING_PATH, UNHANDLED_EVENT,
};
use crate::error::{handle_error, AppError};
use crate::plivo_types::{
    CallRequest, ConferenceAction, ConferenceCallbackPayload, Flag, HttpMethod, Method,
    PlayAction, Response, ResponseAction, RingPayload, SpeakAction, Voice,
};
use crate::types::{
    ApiResponse, AppState, BroadcastEvent, CallParams, ConferenceParams, MembersParams,
    PlayParams,
};
use crate::utils::{normalize_number, request_params, xml_response};

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const HOME_PAGE: &str = include_str!("../templates/home.html");
const NOT_FOUND_PAGE: &str = include_str!("../templates/not_found.html");

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Place an outbound call and map Plivo's answer onto the browser-facing payload.
async fn dial(app_state: &AppState, call: &CallRequest) -> ApiResponse {
    match app_state.make_call(call).await {
        Ok(StatusCode::CREATED) => {
            info!(to=%call.to, "outbound call queued");
            ApiResponse::success()
        }
        Ok(status) => {
            warn!(to=%call.to, status=%status, "plivo refused outbound call");
            ApiResponse::error(CALL_FAILED)
        }
        Err(e) => {
            handle_error(e);
            ApiResponse::error(CALL_FAILED)
        }
    }
}

pub async fn index(State(app_state): State<Arc<AppState>>) -> Html<String> {
    let config = &app_state.config;
    Html(
        HOME_PAGE
            .replace("{{ pusher_key }}", &config.pusher_key)
            .replace("{{ pusher_cluster }}", &config.pusher_cluster)
            .replace("{{ pusher_channel }}", &config.pusher_channel),
    )
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE))
}

/// Call a number and play hold music once it answers.
pub async fn call(
    State(app_state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: String,
) -> Json<ApiResponse> {
    let params = match request_params::<CallParams>(query.as_deref(), &body) {
        Ok(params) => params,
        Err(e) => {
            handle_error(e);
            return Json(ApiResponse::error(NO_NUMBER));
        }
    };
    let Some(number) = non_empty(params.number_call) else {
        return Json(ApiResponse::error(NO_NUMBER));
    };

    let config = &app_state.config;
    let call = CallRequest {
        to: number,
        from: config.plivo_number.clone(),
        answer_url: config.callback_url(MUSIC_PATH),
        answer_method: Method::Get,
        ring_url: Some(config.callback_url(RING_PATH)),
        ring_method: Some(Method::Get),
    };
    Json(dial(&app_state, &call).await)
}

/// Speak text into a live call, identified either by call uuid or by the number it was placed to.
pub async fn call_play(
    State(app_state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: String,
) -> StatusCode {
    let params = match request_params::<PlayParams>(query.as_deref(), &body) {
        Ok(params) => params,
        Err(e) => {
            handle_error(e);
            return StatusCode::BAD_REQUEST;
        }
    };
    let Some(text) = non_empty(params.tts_msg) else {
        return StatusCode::BAD_REQUEST;
    };
    let call_uuid = match (non_empty(params.call_uuid), non_empty(params.number)) {
        (Some(call_uuid), _) => call_uuid,
        (None, Some(number)) => match app_state.store.get(&number).await {
            Ok(Some(call_uuid)) => call_uuid,
            Ok(None) => {
                debug!(number=%number, "no call recorded for number");
                return StatusCode::BAD_REQUEST;
            }
            Err(e) => {
                handle_error(e);
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
        },
        (None, None) => return StatusCode::BAD_REQUEST,
    };

    match app_state.speak(&call_uuid, &text).await {
        Ok(status) if status.is_success() => StatusCode::OK,
        Ok(status) => {
            warn!(call_uuid=%call_uuid, status=%status, "plivo refused speak request");
            StatusCode::BAD_GATEWAY
        }
        Err(e @ AppError::Request(_)) => {
            handle_error(e);
            StatusCode::BAD_REQUEST
        }
        Err(e) => {
            handle_error(e);
            StatusCode::BAD_GATEWAY
        }
    }
}

/// Plivo ring webhook: remember which call rings at which number and tell the browsers.
pub async fn call_ring(
    State(app_state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: String,
) -> StatusCode {
    let payload = match request_params::<RingPayload>(query.as_deref(), &body) {
        Ok(payload) => payload,
        Err(e) => {
            handle_error(e);
            return StatusCode::BAD_REQUEST;
        }
    };
    let (Some(call_uuid), Some(number)) = (non_empty(payload.call_uuid), non_empty(payload.to))
    else {
        error!("ring webhook without CallUUID or To");
        return StatusCode::BAD_REQUEST;
    };
    debug!(number=%number, call_uuid=%call_uuid, "call ringing");

    if let Err(e) = app_state.store.set(&number, &call_uuid).await {
        handle_error(e);
    }
    let number_call_uuid = BTreeMap::from([(number, call_uuid)]);
    if let Err(e) = app_state
        .publish(BroadcastEvent::InCall, &number_call_uuid)
        .await
    {
        handle_error(e);
    }
    StatusCode::OK
}

/// Dial a number into the conference unless it is already there.
pub async fn conference(
    State(app_state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: String,
) -> Json<ApiResponse> {
    let params = match request_params::<ConferenceParams>(query.as_deref(), &body) {
        Ok(params) => params,
        Err(e) => {
            handle_error(e);
            return Json(ApiResponse::error(NO_NUMBER));
        }
    };
    let Some(number) = non_empty(params.number) else {
        return Json(ApiResponse::error(NO_NUMBER));
    };
    // Browsers submit bare US numbers.
    let number = normalize_number(&number);

    let config = &app_state.config;
    let members = match app_state.conference_members(&config.conference_name).await {
        Ok(members) => members,
        Err(e) => {
            handle_error(e);
            return Json(ApiResponse::error(MEMBERSHIP_UNKNOWN));
        }
    };
    if members.iter().any(|m| m.to == number) {
        return Json(ApiResponse::error(ALREADY_IN_CONFERENCE));
    }

    let call = CallRequest {
        to: number,
        from: config.plivo_number.clone(),
        answer_url: config.callback_url(CONFERENCE_ANSWER_PATH),
        answer_method: Method::Get,
        ring_url: None,
        ring_method: None,
    };
    Json(dial(&app_state, &call).await)
}

/// Answer markup for conference legs: greet, then join the room.
pub async fn conference_answer(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = &app_state.config;
    let speak = SpeakAction {
        text: CONFERENCE_WELCOME.to_string(),
        voice: Some(Voice::Woman),
        ..Default::default()
    };
    let conference = ConferenceAction {
        room: config.conference_name.clone(),
        max_members: Some(15),
        enter_sound: Some("beep:1".to_string()),
        wait_sound: Some(config.callback_url(MUSIC_PATH)),
        time_limit: Some(8400),
        floor_event: Some(Flag::True),
        action: Some(config.callback_url(CONFERENCE_ACTION_PATH)),
        callback_url: Some(config.callback_url(CONFERENCE_CALLBACK_PATH)),
        callback_method: Some(HttpMethod::Get),
        ..Default::default()
    };
    xml_response(Response {
        actions: vec![
            ResponseAction::Speak(speak),
            ResponseAction::Conference(conference),
        ],
    })
}

/// Fetched once a leg leaves the conference; nothing left to do but hang up.
pub async fn conference_action() -> impl IntoResponse {
    xml_response(Response { actions: vec![] })
}

/// Conference callback webhook: member changes and floor changes are pushed to the browsers.
pub async fn conference_callback(
    State(app_state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: String,
) -> Json<ApiResponse> {
    let payload = match request_params::<ConferenceCallbackPayload>(query.as_deref(), &body) {
        Ok(payload) => payload,
        Err(e) => {
            handle_error(e);
            return Json(ApiResponse::error(BAD_REQUEST));
        }
    };
    debug!(payload=?payload, "conference callback");
    let conference_name = &app_state.config.conference_name;

    match payload.event.as_deref() {
        Some(event @ (CONFERENCE_ENTER | CONFERENCE_EXIT)) => {
            let members = match app_state.conference_members(conference_name).await {
                Ok(members) => members,
                Err(e) => {
                    handle_error(e);
                    return Json(ApiResponse::error(MEMBERS_UNAVAILABLE));
                }
            };
            // Nobody left to hold the floor.
            if event == CONFERENCE_EXIT && members.is_empty() {
                let nobody: Vec<String> = vec![];
                if let Err(e) = app_state
                    .publish(BroadcastEvent::ShowTalking, &nobody)
                    .await
                {
                    handle_error(e);
                    return Json(ApiResponse::error(BROADCAST_FAILED));
                }
            }
            let numbers: Vec<String> = members.into_iter().map(|m| m.to).collect();
            if let Err(e) = app_state
                .publish(BroadcastEvent::ShowMembers, &numbers)
                .await
            {
                handle_error(e);
                return Json(ApiResponse::error(BROADCAST_FAILED));
            }
            Json(ApiResponse::success())
        }
        _ if payload.conference_action.as_deref() == Some(FLOOR_ACTION) => {
            let talking = match payload.member_id {
                Some(member_id) => {
                    match app_state
                        .conference_member_number(conference_name, &member_id)
                        .await
                    {
                        Ok(number) => number.into_iter().collect::<Vec<String>>(),
                        Err(e) => {
                            handle_error(e);
                            return Json(ApiResponse::error(MEMBERS_UNAVAILABLE));
                        }
                    }
                }
                None => vec![],
            };
            if let Err(e) = app_state
                .publish(BroadcastEvent::ShowTalking, &talking)
                .await
            {
                handle_error(e);
                return Json(ApiResponse::error(BROADCAST_FAILED));
            }
            Json(ApiResponse::success())
        }
        _ => Json(ApiResponse::error(UNHANDLED_EVENT)),
    }
}

/// Hold music markup.
pub async fn conference_music(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let play = PlayAction {
        url: app_state.config.plivo_music.clone(),
        lp: Some(MUSIC_LOOPS),
    };
    xml_response(Response {
        actions: vec![ResponseAction::Play(play)],
    })
}

/// Numbers currently connected to a conference room.
pub async fn conference_members(
    State(app_state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: String,
) -> axum::response::Response {
    let params = match request_params::<MembersParams>(query.as_deref(), &body) {
        Ok(params) => params,
        Err(e) => {
            handle_error(e);
            return Json(ApiResponse::error(BAD_REQUEST)).into_response();
        }
    };
    let room =
        non_empty(params.room).unwrap_or_else(|| app_state.config.conference_name.clone());

    match app_state.conference_members(&room).await {
        Ok(members) => {
            let numbers: Vec<String> = members.into_iter().map(|m| m.to).collect();
            Json(numbers).into_response()
        }
        Err(e) => {
            handle_error(e);
            Json(ApiResponse::error(MEMBERS_UNAVAILABLE)).into_response()
        }
    }
}
