use crate::errors::AppError;
use rental_types::domain::actor::Actor;
use rental_types::domain::booking::{Booking, BookingId, NewBooking};
use rental_types::domain::errors::BookingError;
use rental_types::domain::feedback::{Feedback, FeedbackDraft};
use rental_types::lifecycle::{BookingAction, BookingLifecycle, FeedbackGate, StatusOrderingPolicy};
use rental_types::ports::repository::{RentalRepository, RepoError};
use std::sync::Arc;

/// Server-side authority for bookings. Runs the same lifecycle the client
/// runs, then persists with a version check.
pub struct BookingService<R: RentalRepository> {
    repo: Arc<R>,
    lifecycle: BookingLifecycle,
}

impl<R: RentalRepository> BookingService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            lifecycle: BookingLifecycle::new(),
        }
    }

    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: NewBooking,
    ) -> Result<Booking, AppError> {
        let booking = Booking::new(actor, request)?;
        let booking = self.repo.create_booking(booking).await?;
        tracing::info!(booking_id = %booking.id, customer = %actor.id, "booking created");
        Ok(booking)
    }

    pub async fn list_bookings(&self, actor: &Actor) -> Result<Vec<Booking>, AppError> {
        let bookings = self.repo.list_bookings_for(actor).await?;
        Ok(StatusOrderingPolicy.order(bookings))
    }

    /// Bookings the actor is not a party to are reported as missing.
    pub async fn get_booking(&self, actor: &Actor, id: &BookingId) -> Result<Booking, AppError> {
        match self.repo.get_booking(id).await? {
            Some(b) if b.is_party(actor) => Ok(b),
            _ => Err(BookingError::NotFound(format!("booking {}", id)).into()),
        }
    }

    pub async fn transition(
        &self,
        actor: &Actor,
        id: &BookingId,
        expected_version: u64,
        action: BookingAction,
    ) -> Result<Booking, AppError> {
        let current = self.get_booking(actor, id).await?;
        if current.version != expected_version {
            return Err(BookingError::Conflict(format!(
                "booking {} is at version {}, request expected {}",
                id, current.version, expected_version
            ))
            .into());
        }
        let transition = self.lifecycle.transition(&current, actor, action)?;
        let stored = self
            .repo
            .update_booking(transition.after, expected_version)
            .await?;
        tracing::info!(
            booking_id = %id,
            action = transition.action.name(),
            from = %transition.before.status,
            to = %stored.status,
            version = stored.version,
            actor = %actor.id,
            "booking transition applied"
        );
        Ok(stored)
    }

    pub async fn submit_feedback(
        &self,
        actor: &Actor,
        id: &BookingId,
        draft: FeedbackDraft,
    ) -> Result<Feedback, AppError> {
        let booking = self.get_booking(actor, id).await?;
        let existing = self.repo.get_feedback(id).await?;
        let mut gate = FeedbackGate::with_existing(existing.map(|f| f.booking_id));
        let feedback = gate.submit(&booking, actor, draft)?;
        // A concurrent submission that won the insert closes the gate too.
        let stored = self
            .repo
            .insert_feedback(feedback)
            .await
            .map_err(|e| match e {
                RepoError::Conflict(msg) => AppError::Booking(BookingError::NotEligible(msg)),
                other => other.into(),
            })?;
        tracing::info!(booking_id = %id, rating = stored.rating, "feedback accepted");
        Ok(stored)
    }

    pub async fn list_feedback(&self, actor: &Actor) -> Result<Vec<Feedback>, AppError> {
        Ok(self.repo.list_feedback_by(&actor.id).await?)
    }
}
