use axum::routing::{get, post, put};
use axum::Router;

use crate::interface_adapters::handlers::{admin, session, submissions};
use crate::interface_adapters::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/invite/lookup", post(session::lookup))
        .route("/invite/session/{session_id}", get(session::current_session))
        .route("/invite/rsvp", post(session::update_rsvp))
        .route("/invite/clear", post(session::clear_session))
        .route("/admin/login", post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .route(
            "/admin/guests",
            get(admin::list_guests).post(admin::add_guest),
        )
        .route(
            "/admin/guests/{code}",
            put(admin::update_guest).delete(admin::delete_guest),
        )
        .route("/admin/guests/{code}/status", post(admin::set_status))
        .route("/admin/guests/{code}/share", get(admin::share_guest))
        .route("/admin/undo", post(admin::undo))
        .route("/admin/stats", get(admin::stats))
        .route(
            "/guestbook",
            post(submissions::sign_guestbook).get(submissions::list_guestbook),
        )
        .route(
            "/predictions",
            post(submissions::submit_prediction).get(submissions::list_predictions),
        )
        .route("/predictions/{id}/like", post(submissions::like_prediction))
        .with_state(state)
}
