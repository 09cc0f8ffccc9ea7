use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::domain::errors::SubmissionError;
use crate::interface_adapters::handlers::error_response;
use crate::interface_adapters::protocol::{
    ErrorResponse, GuestbookEntryResponse, GuestbookListResponse, GuestbookSignRequest,
    LikeResponse, PredictionListResponse, PredictionResponse, PredictionSubmitRequest,
};
use crate::interface_adapters::state::{AppState, SystemClock};
use crate::use_cases::submissions::{GuestbookUseCase, PredictionsUseCase};

// Handler for signing the guestbook.
pub async fn sign_guestbook(
    State(state): State<AppState>,
    Json(payload): Json<GuestbookSignRequest>,
) -> Result<(StatusCode, Json<GuestbookEntryResponse>), (StatusCode, Json<ErrorResponse>)> {
    let use_case = GuestbookUseCase {
        store: state.guestbook.clone(),
        clock: SystemClock,
    };
    let entry = use_case
        .sign(&payload.message, payload.author.as_deref())
        .await
        .map_err(|err| map_submission_error(err, SubmissionContext::Guestbook))?;
    Ok((StatusCode::CREATED, Json(GuestbookEntryResponse { entry })))
}

// Handler for reading the guestbook, newest entries first.
pub async fn list_guestbook(
    State(state): State<AppState>,
) -> Result<Json<GuestbookListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let use_case = GuestbookUseCase {
        store: state.guestbook.clone(),
        clock: SystemClock,
    };
    let entries = use_case
        .list()
        .await
        .map_err(|err| map_submission_error(err, SubmissionContext::Guestbook))?;
    Ok(Json(GuestbookListResponse { entries }))
}

// Handler for submitting a prediction.
pub async fn submit_prediction(
    State(state): State<AppState>,
    Json(payload): Json<PredictionSubmitRequest>,
) -> Result<(StatusCode, Json<PredictionResponse>), (StatusCode, Json<ErrorResponse>)> {
    let use_case = PredictionsUseCase {
        board: state.predictions.clone(),
        clock: SystemClock,
    };
    let prediction = use_case
        .submit(&payload.text)
        .await
        .map_err(|err| map_submission_error(err, SubmissionContext::Predictions))?;
    Ok((StatusCode::CREATED, Json(PredictionResponse { prediction })))
}

// Handler for listing predictions, most liked first.
pub async fn list_predictions(
    State(state): State<AppState>,
) -> Result<Json<PredictionListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let use_case = PredictionsUseCase {
        board: state.predictions.clone(),
        clock: SystemClock,
    };
    let predictions = use_case
        .list()
        .await
        .map_err(|err| map_submission_error(err, SubmissionContext::Predictions))?;
    Ok(Json(PredictionListResponse { predictions }))
}

// Handler for liking a prediction.
pub async fn like_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let use_case = PredictionsUseCase {
        board: state.predictions.clone(),
        clock: SystemClock,
    };
    let likes = use_case
        .like(&id)
        .await
        .map_err(|err| map_submission_error(err, SubmissionContext::Predictions))?;
    Ok(Json(LikeResponse { likes }))
}

// Maps submission errors to HTTP responses by endpoint context.
enum SubmissionContext {
    Guestbook,
    Predictions,
}

fn map_submission_error(
    err: SubmissionError,
    context: SubmissionContext,
) -> (StatusCode, Json<ErrorResponse>) {
    match context {
        SubmissionContext::Guestbook => match err {
            SubmissionError::EmptyMessage => {
                error_response(StatusCode::BAD_REQUEST, "message is required")
            }
            SubmissionError::UnknownEntry => {
                error_response(StatusCode::NOT_FOUND, "unknown entry")
            }
            SubmissionError::StorageFailure => {
                error_response(StatusCode::BAD_GATEWAY, "storage error")
            }
        },
        SubmissionContext::Predictions => match err {
            SubmissionError::EmptyMessage => {
                error_response(StatusCode::BAD_REQUEST, "prediction is required")
            }
            SubmissionError::UnknownEntry => {
                error_response(StatusCode::NOT_FOUND, "unknown prediction")
            }
            SubmissionError::StorageFailure => {
                error_response(StatusCode::BAD_GATEWAY, "storage error")
            }
        },
    }
}
