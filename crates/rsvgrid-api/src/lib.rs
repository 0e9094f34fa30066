//! rsvgrid-api — HTTP surface of a coordination node.
//!
//! Serves the peer protocol that other nodes call, the booking handler
//! that wraps ticket writes in the critical section, and status routes.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/request` | Peer asks to enter (200 permitted, 202 queued) |
//! | POST | `/reply` | Peer grants the section to a queued requester |
//! | POST | `/release` | Peer left the section |
//! | POST | `/book` | Book a seat inside the critical section |
//! | GET | `/trains` | Trains with their available seats |
//! | GET | `/users/{user_id}/tickets` | List a user's tickets |
//! | DELETE | `/tickets/{ticket_id}?user_id=` | Cancel a ticket |
//! | GET | `/status` | Node coordination snapshot |
//! | GET | `/healthz` | Liveness |

pub mod booking;
pub mod error;
pub mod peer;
pub mod tickets;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use rsvgrid_coord::Coordinator;

pub use error::{ApiError, ApiResponse};
pub use tickets::{
    InMemoryTicketStore, NewTicket, Ticket, TicketError, TicketStore, Train, TrainAvailability,
};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ApiState {
    pub coordinator: Arc<Coordinator>,
    pub tickets: Arc<dyn TicketStore>,
}

/// Build the node's router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/request", post(peer::handle_request))
        .route("/reply", post(peer::handle_reply))
        .route("/release", post(peer::handle_release))
        .route("/book", post(booking::book))
        .route("/trains", get(booking::available_trains))
        .route("/users/{user_id}/tickets", get(booking::user_tickets))
        .route("/tickets/{ticket_id}", delete(booking::cancel_ticket))
        .route("/status", get(peer::status))
        .route("/healthz", get(peer::healthz))
        .with_state(state)
}
