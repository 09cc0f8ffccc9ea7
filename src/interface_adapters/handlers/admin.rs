use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::domain::entities::RsvpStatus;
use crate::domain::errors::{AccessError, RegistryError};
use crate::domain::ports::{AuditLog, GuestStore, StorageCache};
use crate::interface_adapters::handlers::error_response;
use crate::interface_adapters::protocol::{
    AdminLoginRequest, AdminLoginResponse, AdminLogoutRequest, AdminLogoutResponse, DeleteResponse,
    ErrorResponse, GuestListQuery, GuestListResponse, GuestResponse, GuestUpsertRequest,
    ShareResponse, StatsResponse, StatusChangeRequest, UndoResponse,
};
use crate::interface_adapters::state::{AppState, SystemClock};
use crate::use_cases::admin_access::AdminAccessUseCase;
use crate::use_cases::admin_guests::{AdminGuestsUseCase, GuestPayload};

// Admin requests carry their token in this header.
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn access_use_case(state: &AppState) -> AdminAccessUseCase<SystemClock> {
    AdminAccessUseCase {
        clock: SystemClock,
        sessions: state.admin_sessions.clone(),
        passcode: state.admin_passcode.clone(),
        ttl_seconds: state.admin_session_ttl_seconds,
    }
}

// Shared constructor so the server can drive bootstrap and sync with the
// same wiring the handlers use.
pub fn guests_use_case(
    state: &AppState,
) -> AdminGuestsUseCase<Arc<dyn GuestStore>, Arc<dyn StorageCache>, SystemClock, Arc<dyn AuditLog>>
{
    AdminGuestsUseCase {
        registry: state.registry.clone(),
        store: state.guest_store.clone(),
        cache: state.cache.clone(),
        clock: SystemClock,
        audit: state.audit.clone(),
    }
}

async fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let token = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    access_use_case(state).verify(token).await.map_err(map_access_error)
}

// Handler for admin login.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    let grant = access_use_case(&state)
        .login(&payload.passcode)
        .await
        .map_err(map_access_error)?;

    Ok(Json(AdminLoginResponse {
        token: grant.token,
        expires_at: grant.expires_at,
    }))
}

// Handler for admin logout.
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<AdminLogoutRequest>,
) -> Result<Json<AdminLogoutResponse>, (StatusCode, Json<ErrorResponse>)> {
    let revoked = access_use_case(&state).logout(&payload.token).await;
    Ok(Json(AdminLogoutResponse { revoked }))
}

// Handler for listing guests with search and status filters.
pub async fn list_guests(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GuestListQuery>,
) -> Result<Json<GuestListResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state, &headers).await?;
    let status = parse_status_filter(query.status.as_deref())?;
    let guests = guests_use_case(&state)
        .list(query.q.as_deref().unwrap_or_default(), status)
        .await;
    Ok(Json(GuestListResponse { guests }))
}

// Handler for adding a guest.
pub async fn add_guest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<GuestUpsertRequest>,
) -> Result<(StatusCode, Json<GuestResponse>), (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state, &headers).await?;
    let guest = guests_use_case(&state)
        .add_guest(to_payload(payload))
        .await
        .map_err(map_registry_error)?;
    Ok((StatusCode::CREATED, Json(GuestResponse { guest })))
}

// Handler for updating a guest.
pub async fn update_guest(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<GuestUpsertRequest>,
) -> Result<Json<GuestResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state, &headers).await?;
    let guest = guests_use_case(&state)
        .update_guest(&code, to_payload(payload))
        .await
        .map_err(map_registry_error)?;
    Ok(Json(GuestResponse { guest }))
}

// Handler for removing a guest.
pub async fn delete_guest(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state, &headers).await?;
    let removed = guests_use_case(&state)
        .delete_guest(&code)
        .await
        .map_err(map_registry_error)?;
    Ok(Json(DeleteResponse { removed }))
}

// Handler for changing a guest's RSVP status.
pub async fn set_status(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<StatusChangeRequest>,
) -> Result<Json<GuestResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state, &headers).await?;
    let guest = guests_use_case(&state)
        .set_rsvp_status(&code, payload.status)
        .await
        .map_err(map_registry_error)?;
    Ok(Json(GuestResponse { guest }))
}

// Handler for reverting the most recent registry change.
pub async fn undo(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UndoResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state, &headers).await?;
    let label = guests_use_case(&state).undo().await;
    Ok(Json(UndoResponse {
        restored: label.is_some(),
        label,
    }))
}

// Handler for registry statistics.
pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state, &headers).await?;
    let stats = guests_use_case(&state).stats().await;
    Ok(Json(StatsResponse {
        total: stats.total,
        confirmed: stats.confirmed,
        pending: stats.pending,
        declined: stats.declined,
        expected_attendees: stats.expected_attendees,
    }))
}

// Handler for building a shareable invite link and message.
pub async fn share_guest(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ShareResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state, &headers).await?;
    let share = guests_use_case(&state)
        .share(&code, &state.public_origin, &state.event_title)
        .await
        .map_err(map_registry_error)?;
    Ok(Json(ShareResponse {
        link: share.link,
        message: share.message,
    }))
}

fn to_payload(request: GuestUpsertRequest) -> GuestPayload {
    GuestPayload {
        code: request.code,
        guest_names: request.guest_names,
        household_id: request.household_id,
        household_count: request.household_count,
        contact: request.contact,
        notes: request.notes,
        rsvp_status: request.rsvp_status,
        role: request.role,
    }
}

// "all" and an empty value both mean no status filter.
fn parse_status_filter(
    raw: Option<&str>,
) -> Result<Option<RsvpStatus>, (StatusCode, Json<ErrorResponse>)> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    match RsvpStatus::parse(&trimmed.to_ascii_lowercase()) {
        Some(status) => Ok(Some(status)),
        None => Err(error_response(
            StatusCode::BAD_REQUEST,
            "unknown status filter",
        )),
    }
}

fn map_access_error(err: AccessError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        AccessError::InvalidPasscode => {
            error_response(StatusCode::UNAUTHORIZED, "Incorrect passcode")
        }
        AccessError::InvalidToken => {
            error_response(StatusCode::UNAUTHORIZED, "invalid admin token")
        }
        AccessError::SessionExpired => {
            error_response(StatusCode::UNAUTHORIZED, "admin session expired")
        }
    }
}

fn map_registry_error(err: RegistryError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        RegistryError::MissingGuestName => error_response(
            StatusCode::BAD_REQUEST,
            "Please provide at least one guest name.",
        ),
        RegistryError::InvalidContact => error_response(
            StatusCode::BAD_REQUEST,
            "Please provide a valid email or phone number.",
        ),
        RegistryError::UnknownCode => {
            error_response(StatusCode::NOT_FOUND, "unknown invite code")
        }
    }
}
