//! Ticket store seam.
//!
//! The booking handler only needs create/cancel/list and seat availability.
//! Production deployments put a SQL store behind [`TicketStore`];
//! [`InMemoryTicketStore`] backs tests and single-process demos.
//!
//! A ticket can only be created for a known train, for a seat between 1 and
//! the train's `total_seats`, and only once per `(train_id, seat_number)`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A bookable train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    pub id: Uuid,
    pub name: String,
    pub total_seats: u32,
}

/// A train with its remaining capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainAvailability {
    pub id: Uuid,
    pub name: String,
    pub total_seats: u32,
    pub available_seats: u32,
}

/// A booked seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    pub id: Uuid,
    pub train_id: Uuid,
    pub user_id: String,
    pub seat_number: u32,
}

/// Input for [`TicketStore::create_ticket`].
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub train_id: Uuid,
    pub user_id: String,
    pub seat_number: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TicketError {
    #[error("train {0} not found")]
    UnknownTrain(Uuid),

    #[error("seat {seat_number} does not exist on train {train_id} (seats 1..={total_seats})")]
    InvalidSeat {
        train_id: Uuid,
        seat_number: u32,
        total_seats: u32,
    },

    #[error("seat {seat_number} on train {train_id} is already booked")]
    SeatTaken { train_id: Uuid, seat_number: u32 },

    #[error("ticket {0} not found")]
    NotFound(Uuid),
}

pub trait TicketStore: Send + Sync {
    fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, TicketError>;

    /// Cancel `ticket_id` if it belongs to `user_id`.
    fn cancel_ticket(&self, ticket_id: Uuid, user_id: &str) -> Result<(), TicketError>;

    fn user_tickets(&self, user_id: &str) -> Vec<Ticket>;

    /// Every train with its number of unbooked seats.
    fn available_trains(&self) -> Vec<TrainAvailability>;
}

#[derive(Debug, Default)]
struct Inner {
    trains: Vec<Train>,
    tickets: Vec<Ticket>,
}

/// Trains and tickets in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    inner: Mutex<Inner>,
}

impl InMemoryTicketStore {
    /// An empty store: no trains, so every booking fails with `UnknownTrain`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trains(trains: impl IntoIterator<Item = Train>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                trains: trains.into_iter().collect(),
                tickets: Vec::new(),
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TicketStore for InMemoryTicketStore {
    fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, TicketError> {
        let mut inner = self.inner();
        let train = inner
            .trains
            .iter()
            .find(|t| t.id == ticket.train_id)
            .ok_or(TicketError::UnknownTrain(ticket.train_id))?;

        if !(1..=train.total_seats).contains(&ticket.seat_number) {
            return Err(TicketError::InvalidSeat {
                train_id: ticket.train_id,
                seat_number: ticket.seat_number,
                total_seats: train.total_seats,
            });
        }

        let taken = inner
            .tickets
            .iter()
            .any(|t| t.train_id == ticket.train_id && t.seat_number == ticket.seat_number);
        if taken {
            return Err(TicketError::SeatTaken {
                train_id: ticket.train_id,
                seat_number: ticket.seat_number,
            });
        }

        let created = Ticket {
            id: Uuid::new_v4(),
            train_id: ticket.train_id,
            user_id: ticket.user_id,
            seat_number: ticket.seat_number,
        };
        inner.tickets.push(created.clone());
        Ok(created)
    }

    fn cancel_ticket(&self, ticket_id: Uuid, user_id: &str) -> Result<(), TicketError> {
        let mut inner = self.inner();
        let idx = inner
            .tickets
            .iter()
            .position(|t| t.id == ticket_id && t.user_id == user_id)
            .ok_or(TicketError::NotFound(ticket_id))?;
        inner.tickets.remove(idx);
        Ok(())
    }

    fn user_tickets(&self, user_id: &str) -> Vec<Ticket> {
        self.inner()
            .tickets
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    fn available_trains(&self) -> Vec<TrainAvailability> {
        let inner = self.inner();
        inner
            .trains
            .iter()
            .map(|train| {
                let booked = inner.tickets.iter().filter(|t| t.train_id == train.id).count();
                TrainAvailability {
                    id: train.id,
                    name: train.name.clone(),
                    total_seats: train.total_seats,
                    available_seats: train
                        .total_seats
                        .saturating_sub(u32::try_from(booked).unwrap_or(u32::MAX)),
                }
            })
            .collect()
    }
}
