//! API error type and the JSON response envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::tickets::TicketError;

/// Response wrapper for consistent API format.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Undecodable inbound peer body. No state was touched.
    #[error("malformed {kind} message: {reason}")]
    MalformedPeerMessage { kind: &'static str, reason: String },

    #[error("invalid booking: {0}")]
    InvalidBooking(String),

    /// The local `acquire` was denied; the caller should retry later.
    #[error("booking is in progress elsewhere on node {node_id}, retry shortly")]
    Busy { node_id: String },

    #[error(transparent)]
    Ticket(#[from] TicketError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedPeerMessage { .. } | ApiError::InvalidBooking(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Busy { .. } => StatusCode::CONFLICT,
            ApiError::Ticket(TicketError::InvalidSeat { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Ticket(TicketError::SeatTaken { .. }) => StatusCode::CONFLICT,
            ApiError::Ticket(TicketError::UnknownTrain(_) | TicketError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
        };
        (self.status(), Json(body)).into_response()
    }
}
