//! Booking handlers.
//!
//! Seat writes run inside the node's critical section. The guard returned
//! by [`Coordinator::enter`](rsvgrid_coord::Coordinator::enter) releases
//! the section on every exit path, including ticket store errors.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ApiState;
use crate::error::{ApiError, ApiResponse};
use crate::tickets::{NewTicket, Ticket, TrainAvailability};

#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub user_id: String,
    pub train_id: Uuid,
    pub seat_number: i64,
}

impl BookingRequest {
    fn decode(body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(body).map_err(|e| {
            warn!(error = %e, "rejecting malformed booking");
            ApiError::InvalidBooking(e.to_string())
        })
    }

    fn validate(self) -> Result<NewTicket, ApiError> {
        if self.user_id.trim().is_empty() {
            return Err(ApiError::InvalidBooking("user_id must not be empty".into()));
        }
        let seat_number = u32::try_from(self.seat_number)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ApiError::InvalidBooking(format!(
                    "seat_number must be a positive integer, got {}",
                    self.seat_number
                ))
            })?;
        Ok(NewTicket {
            train_id: self.train_id,
            user_id: self.user_id,
            seat_number,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: String,
}

/// POST /book
pub async fn book(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<Ticket>>), ApiError> {
    let new_ticket = BookingRequest::decode(&body)?.validate()?;

    let coordinator = &state.coordinator;
    let Some(_section) = coordinator.enter(&new_ticket.user_id) else {
        debug!(user_id = %new_ticket.user_id, "booking deferred, section busy");
        return Err(ApiError::Busy {
            node_id: coordinator.node_id().to_string(),
        });
    };

    let ticket = state.tickets.create_ticket(new_ticket)?;
    info!(
        ticket_id = %ticket.id,
        train_id = %ticket.train_id,
        seat = ticket.seat_number,
        user_id = %ticket.user_id,
        "ticket booked"
    );
    Ok((StatusCode::CREATED, ApiResponse::ok(ticket)))
}

/// GET /trains
pub async fn available_trains(
    State(state): State<ApiState>,
) -> Json<ApiResponse<Vec<TrainAvailability>>> {
    ApiResponse::ok(state.tickets.available_trains())
}

/// GET /users/{user_id}/tickets
pub async fn user_tickets(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Json<ApiResponse<Vec<Ticket>>> {
    ApiResponse::ok(state.tickets.user_tickets(&user_id))
}

/// DELETE /tickets/{ticket_id}?user_id=
pub async fn cancel_ticket(
    State(state): State<ApiState>,
    Path(ticket_id): Path<Uuid>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<Uuid>>, ApiError> {
    state.tickets.cancel_ticket(ticket_id, &owner.user_id)?;
    info!(%ticket_id, user_id = %owner.user_id, "ticket cancelled");
    Ok(ApiResponse::ok(ticket_id))
}
