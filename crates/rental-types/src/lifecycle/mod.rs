//! Booking and order state machines plus the pieces the client and server
//! share around them: display ordering, the booking snapshot store,
//! cancellation attribution and the feedback gate.

pub mod attribution;
pub mod feedback_gate;
pub mod order;
pub mod ordering;
pub mod store;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::domain::actor::Actor;
use crate::domain::booking::{Booking, BookingId, BookingStatus, TimeSlot};
use crate::domain::errors::BookingError;

pub use attribution::CancellationAttributor;
pub use feedback_gate::FeedbackGate;
pub use order::OrderLifecycle;
pub use ordering::StatusOrderingPolicy;
pub use store::{BookingStore, StatusGroup};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingAction {
    Confirm,
    Complete,
    Cancel {
        reason: Option<String>,
    },
    /// Reschedule without touching the status. Bounds are raw so the state
    /// machine owns the `start < end` check.
    Modify {
        booking_date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },
}

impl BookingAction {
    pub fn name(&self) -> &'static str {
        match self {
            BookingAction::Confirm => "confirm",
            BookingAction::Complete => "complete",
            BookingAction::Cancel { .. } => "cancel",
            BookingAction::Modify { .. } => "modify",
        }
    }
}

/// Outcome of a successful transition: the record before and the freshly
/// built record after. `before` is what a rollback restores.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub action: BookingAction,
    pub before: Booking,
    pub after: Booking,
}

impl Transition {
    pub fn booking_id(&self) -> &BookingId {
        &self.after.id
    }

    /// The inverse transition, used to undo an optimistic apply.
    pub fn reverted(&self) -> Transition {
        Transition {
            action: self.action.clone(),
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }
}

/// Pending -> Confirmed -> Completed, with Cancelled reachable from both
/// non-terminal states. Completed and Cancelled admit nothing further.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingLifecycle {
    attributor: CancellationAttributor,
}

impl BookingLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transition(
        &self,
        booking: &Booking,
        actor: &Actor,
        action: BookingAction,
    ) -> Result<Transition, BookingError> {
        self.transition_at(booking, actor, action, Utc::now())
    }

    pub fn transition_at(
        &self,
        booking: &Booking,
        actor: &Actor,
        action: BookingAction,
        now: DateTime<Utc>,
    ) -> Result<Transition, BookingError> {
        if booking.status.is_terminal() {
            return Err(BookingError::InvalidTransition(format!(
                "cannot {} booking {}: status {} is terminal",
                action.name(),
                booking.id,
                booking.status
            )));
        }

        let mut next = booking.clone();
        match &action {
            BookingAction::Confirm => {
                require_provider(booking, actor, &action)?;
                require_status(booking, BookingStatus::Pending, &action)?;
                next.status = BookingStatus::Confirmed;
            }
            BookingAction::Complete => {
                require_provider(booking, actor, &action)?;
                require_status(booking, BookingStatus::Confirmed, &action)?;
                next.status = BookingStatus::Completed;
            }
            BookingAction::Cancel { reason } => {
                require_party(booking, actor, &action)?;
                let cancellation = self.attributor.attribute(actor, reason.clone(), now)?;
                next.status = BookingStatus::Cancelled;
                next.cancellation = Some(cancellation);
            }
            BookingAction::Modify {
                booking_date,
                start,
                end,
            } => {
                require_party(booking, actor, &action)?;
                next.time_slot = TimeSlot::new(*start, *end)?;
                next.booking_date = Some(*booking_date);
            }
        }
        next.updated_at = now;

        Ok(Transition {
            action,
            before: booking.clone(),
            after: next,
        })
    }
}

fn require_provider(
    booking: &Booking,
    actor: &Actor,
    action: &BookingAction,
) -> Result<(), BookingError> {
    if booking.is_provider(actor) {
        return Ok(());
    }
    Err(BookingError::UnauthorizedActor(format!(
        "{} {} is not the provider of booking {} and may not {}",
        actor.role,
        actor.id,
        booking.id,
        action.name()
    )))
}

fn require_party(
    booking: &Booking,
    actor: &Actor,
    action: &BookingAction,
) -> Result<(), BookingError> {
    if booking.is_party(actor) {
        return Ok(());
    }
    Err(BookingError::UnauthorizedActor(format!(
        "{} {} is not a party to booking {} and may not {}",
        actor.role,
        actor.id,
        booking.id,
        action.name()
    )))
}

fn require_status(
    booking: &Booking,
    expected: BookingStatus,
    action: &BookingAction,
) -> Result<(), BookingError> {
    if booking.status == expected {
        return Ok(());
    }
    Err(BookingError::InvalidTransition(format!(
        "cannot {} booking {} from {} (expected {})",
        action.name(),
        booking.id,
        booking.status,
        expected
    )))
}
