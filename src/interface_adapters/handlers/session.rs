use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::domain::errors::SessionError;
use crate::domain::ports::{GuestStore, StorageCache};
use crate::interface_adapters::handlers::error_response;
use crate::interface_adapters::protocol::{
    ClearRequest, ClearResponse, ErrorResponse, LookupRequest, LookupResponse, RsvpRequest,
    RsvpResponse, SessionResponse,
};
use crate::interface_adapters::state::{AppState, SystemClock};
use crate::use_cases::session::{
    RsvpDetails, SessionManager, EMPTY_CODE_MESSAGE, LOOKUP_FAILED_MESSAGE, RSVP_FAILED_MESSAGE,
    UNKNOWN_CODE_MESSAGE,
};

// Session blobs are cached under this prefix plus the caller's session id.
const SESSION_KEY_PREFIX: &str = "invite-session:";

type Manager = SessionManager<Arc<dyn GuestStore>, Arc<dyn StorageCache>, SystemClock>;

fn build_manager(state: &AppState, session_id: &str) -> Manager {
    SessionManager::new(
        state.guest_store.clone(),
        state.cache.clone(),
        SystemClock,
        state.directory.clone(),
        format!("{SESSION_KEY_PREFIX}{session_id}"),
    )
}

// Handler for resolving an invite code into a session.
pub async fn lookup(
    State(state): State<AppState>,
    Json(payload): Json<LookupRequest>,
) -> Result<Json<LookupResponse>, (StatusCode, Json<ErrorResponse>)> {
    let session_id = payload
        .session_id
        .filter(|session_id| !session_id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let manager = build_manager(&state, &session_id);
    let guest = manager
        .lookup(&payload.invite_code)
        .await
        .map_err(|err| map_session_error(err, SessionErrorContext::Lookup))?;

    Ok(Json(LookupResponse { session_id, guest }))
}

// Handler for reading a session back by id.
pub async fn current_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, (StatusCode, Json<ErrorResponse>)> {
    let manager = build_manager(&state, &session_id);
    match manager.restore().await {
        Some(guest) => Ok(Json(SessionResponse { guest })),
        None => Err(map_session_error(
            SessionError::NoActiveSession,
            SessionErrorContext::Read,
        )),
    }
}

// Handler for recording an RSVP against a session.
pub async fn update_rsvp(
    State(state): State<AppState>,
    Json(payload): Json<RsvpRequest>,
) -> Result<Json<RsvpResponse>, (StatusCode, Json<ErrorResponse>)> {
    let manager = build_manager(&state, &payload.session_id);
    let _ = manager.restore().await;

    let details = RsvpDetails {
        notes: payload.notes,
        additional_guests: payload.additional_guests,
        contact: payload.contact,
    };
    let guest = manager
        .update_rsvp(payload.status, details)
        .await
        .map_err(|err| map_session_error(err, SessionErrorContext::Rsvp))?;

    Ok(Json(RsvpResponse { guest }))
}

// Handler for dropping a session.
pub async fn clear_session(
    State(state): State<AppState>,
    Json(payload): Json<ClearRequest>,
) -> Result<Json<ClearResponse>, (StatusCode, Json<ErrorResponse>)> {
    let manager = build_manager(&state, &payload.session_id);
    manager.clear().await;
    Ok(Json(ClearResponse { cleared: true }))
}

// Maps session errors to HTTP responses by endpoint context.
enum SessionErrorContext {
    Lookup,
    Rsvp,
    Read,
}

fn map_session_error(
    err: SessionError,
    context: SessionErrorContext,
) -> (StatusCode, Json<ErrorResponse>) {
    match context {
        SessionErrorContext::Lookup => match err {
            SessionError::EmptyCode => error_response(StatusCode::BAD_REQUEST, EMPTY_CODE_MESSAGE),
            SessionError::UnknownCode => {
                error_response(StatusCode::NOT_FOUND, UNKNOWN_CODE_MESSAGE)
            }
            SessionError::StoreFailure => {
                error_response(StatusCode::BAD_GATEWAY, LOOKUP_FAILED_MESSAGE)
            }
            SessionError::Superseded => {
                error_response(StatusCode::CONFLICT, "superseded by a newer lookup")
            }
            SessionError::NoActiveSession => {
                error_response(StatusCode::NOT_FOUND, "no active session")
            }
        },
        SessionErrorContext::Rsvp => match err {
            SessionError::NoActiveSession => {
                error_response(StatusCode::NOT_FOUND, "no active session")
            }
            SessionError::StoreFailure => {
                error_response(StatusCode::BAD_GATEWAY, RSVP_FAILED_MESSAGE)
            }
            SessionError::EmptyCode | SessionError::UnknownCode | SessionError::Superseded => {
                error_response(StatusCode::BAD_REQUEST, "invalid session state")
            }
        },
        SessionErrorContext::Read => match err {
            SessionError::NoActiveSession
            | SessionError::EmptyCode
            | SessionError::UnknownCode
            | SessionError::StoreFailure
            | SessionError::Superseded => {
                error_response(StatusCode::NOT_FOUND, "no active session")
            }
        },
    }
}
