use super::{
    ErrorResponse, ListResponse, RsvpError, RsvpRequest, SubmitResponse, export,
    filter_listing, list_with_guests, submit_rsvp,
};
use crate::AppState;
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, warn};

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Any method the RSVP endpoints don't serve.
pub async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

#[axum::debug_handler]
pub async fn submit_rsvp_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<RsvpRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected RSVP body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
        }
    };

    match submit_rsvp(app_state.rsvp_store.as_ref(), &request).await {
        Ok(receipt) => Json(SubmitResponse {
            success: true,
            data: receipt,
            message: "RSVP submitted successfully".to_string(),
        })
        .into_response(),
        Err(RsvpError::MissingFields) => {
            error_response(StatusCode::BAD_REQUEST, "Missing required fields")
        }
        Err(RsvpError::GuestInsertFailed(_)) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save guest information",
        ),
        Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save RSVP"),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[axum::debug_handler]
pub async fn list_rsvps_handler(
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    match list_with_guests(app_state.rsvp_store.as_ref()).await {
        Ok(listing) => {
            let listing = match query.q.as_deref() {
                Some(term) => filter_listing(listing, term),
                None => listing,
            };
            Json(ListResponse {
                success: true,
                total: listing.len(),
                data: listing,
            })
            .into_response()
        }
        Err(e) => {
            error!("Failed to list RSVPs: {}", e);
            let message = match e {
                RsvpError::GuestFetchFailed(_) => "Failed to fetch guest records",
                _ => "Failed to fetch RSVP records",
            };
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

#[axum::debug_handler]
pub async fn export_rsvps_handler(State(app_state): State<AppState>) -> Response {
    match export::export_bytes(app_state.rsvp_store.as_ref()).await {
        Ok(bytes) => {
            let file_name = export::file_name(Utc::now().date_naive());
            (
                [
                    (header::CONTENT_TYPE, export::CONTENT_TYPE.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file_name),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to export RSVPs: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to export data to Excel",
            )
        }
    }
}
