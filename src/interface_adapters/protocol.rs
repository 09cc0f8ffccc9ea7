use serde::{Deserialize, Serialize};

use crate::domain::entities::{GuestRecord, GuestRole, GuestbookEntry, Prediction, RsvpStatus};

// Request payload for invite code lookup. The session id is minted by the
// server when the client does not send one.
#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub invite_code: String,
    pub session_id: Option<String>,
}

// Response payload for invite code lookup.
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub session_id: String,
    pub guest: GuestRecord,
}

// Response payload for reading a session back.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub guest: GuestRecord,
}

// Request payload for an RSVP.
#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    pub session_id: String,
    pub status: RsvpStatus,
    pub notes: Option<String>,
    pub additional_guests: Option<u32>,
    pub contact: Option<String>,
}

// Response payload for an RSVP.
#[derive(Debug, Serialize)]
pub struct RsvpResponse {
    pub guest: GuestRecord,
}

// Request payload for dropping a session.
#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    pub session_id: String,
}

// Response payload for dropping a session.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

// Request payload for admin login.
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub passcode: String,
}

// Response payload for admin login.
#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub expires_at: u64,
}

// Request payload for admin logout.
#[derive(Debug, Deserialize)]
pub struct AdminLogoutRequest {
    pub token: String,
}

// Response payload for admin logout.
#[derive(Debug, Serialize)]
pub struct AdminLogoutResponse {
    pub revoked: bool,
}

// Query string for the guest list: free-text search plus a status filter.
#[derive(Debug, Default, Deserialize)]
pub struct GuestListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
}

// Response payload for the guest list.
#[derive(Debug, Serialize)]
pub struct GuestListResponse {
    pub guests: Vec<GuestRecord>,
}

// Request payload for adding or updating a guest. Omitted fields keep their
// stored values on update.
#[derive(Debug, Deserialize)]
pub struct GuestUpsertRequest {
    pub code: Option<String>,
    #[serde(default)]
    pub guest_names: Vec<String>,
    pub household_id: Option<String>,
    pub household_count: Option<u32>,
    pub contact: Option<String>,
    pub notes: Option<String>,
    pub rsvp_status: Option<RsvpStatus>,
    pub role: Option<GuestRole>,
}

// Response payload carrying a single guest.
#[derive(Debug, Serialize)]
pub struct GuestResponse {
    pub guest: GuestRecord,
}

// Response payload for a guest removal.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub removed: GuestRecord,
}

// Request payload for an admin RSVP status change.
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: RsvpStatus,
}

// Response payload for an undo attempt.
#[derive(Debug, Serialize)]
pub struct UndoResponse {
    pub restored: bool,
    pub label: Option<String>,
}

// Response payload for registry statistics.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total: u64,
    pub confirmed: u64,
    pub pending: u64,
    pub declined: u64,
    pub expected_attendees: u64,
}

// Response payload for an invite share.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub link: String,
    pub message: String,
}

// Request payload for signing the guestbook.
#[derive(Debug, Deserialize)]
pub struct GuestbookSignRequest {
    pub message: String,
    pub author: Option<String>,
}

// Response payload carrying a single guestbook entry.
#[derive(Debug, Serialize)]
pub struct GuestbookEntryResponse {
    pub entry: GuestbookEntry,
}

// Response payload for the guestbook listing.
#[derive(Debug, Serialize)]
pub struct GuestbookListResponse {
    pub entries: Vec<GuestbookEntry>,
}

// Request payload for submitting a prediction.
#[derive(Debug, Deserialize)]
pub struct PredictionSubmitRequest {
    pub text: String,
}

// Response payload carrying a single prediction.
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: Prediction,
}

// Response payload for the prediction listing.
#[derive(Debug, Serialize)]
pub struct PredictionListResponse {
    pub predictions: Vec<Prediction>,
}

// Response payload for liking a prediction.
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub likes: u32,
}

// Simple error envelope for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}
