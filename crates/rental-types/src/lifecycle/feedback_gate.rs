use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::domain::actor::Actor;
use crate::domain::booking::{Booking, BookingId, BookingStatus};
use crate::domain::errors::BookingError;
use crate::domain::feedback::{Feedback, FeedbackDraft};

/// Feedback is accepted once per booking, and only after completion.
/// Check it before offering the form and again before accepting a draft.
#[derive(Debug, Clone, Default)]
pub struct FeedbackGate {
    reviewed: HashSet<BookingId>,
}

impl FeedbackGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(reviewed: impl IntoIterator<Item = BookingId>) -> Self {
        Self {
            reviewed: reviewed.into_iter().collect(),
        }
    }

    pub fn can_submit(&self, booking: &Booking) -> bool {
        self.check(booking).is_ok()
    }

    pub fn check(&self, booking: &Booking) -> Result<(), BookingError> {
        if booking.status != BookingStatus::Completed {
            return Err(BookingError::NotEligible(format!(
                "booking {} is {}, feedback opens once it is Completed",
                booking.id, booking.status
            )));
        }
        if self.reviewed.contains(&booking.id) {
            return Err(BookingError::NotEligible(format!(
                "booking {} already has feedback",
                booking.id
            )));
        }
        Ok(())
    }

    pub fn submit(
        &mut self,
        booking: &Booking,
        author: &Actor,
        draft: FeedbackDraft,
    ) -> Result<Feedback, BookingError> {
        self.submit_at(booking, author, draft, Utc::now())
    }

    pub fn submit_at(
        &mut self,
        booking: &Booking,
        author: &Actor,
        draft: FeedbackDraft,
        now: DateTime<Utc>,
    ) -> Result<Feedback, BookingError> {
        self.check(booking)?;
        if !booking.is_customer(author) {
            return Err(BookingError::UnauthorizedActor(format!(
                "{} {} is not the customer of booking {}",
                author.role, author.id, booking.id
            )));
        }
        draft.validate()?;
        let feedback = Feedback {
            booking_id: booking.id.clone(),
            author_ref: author.id.clone(),
            rating: draft.rating,
            service_quality: draft.service_quality,
            message: draft.message,
            created_at: now,
        };
        self.record(&feedback);
        Ok(feedback)
    }

    /// Marks a booking as reviewed, e.g. after the server accepted feedback.
    pub fn record(&mut self, feedback: &Feedback) {
        self.reviewed.insert(feedback.booking_id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feedback::ServiceQuality;
    use crate::lifecycle::tests::{customer, pending, provider};
    use crate::lifecycle::{BookingAction, BookingLifecycle};

    fn excellent() -> FeedbackDraft {
        FeedbackDraft {
            rating: 5,
            service_quality: ServiceQuality::Excellent,
            message: "spotless".into(),
        }
    }

    #[test]
    fn closed_until_completed_and_after_one_feedback() {
        let lifecycle = BookingLifecycle::new();
        let mut gate = FeedbackGate::new();

        let booking = pending("B1");
        assert!(!gate.can_submit(&booking));

        let booking = lifecycle
            .transition(&booking, &provider(), BookingAction::Confirm)
            .unwrap()
            .after;
        assert!(!gate.can_submit(&booking));
        let err = gate.submit(&booking, &customer(), excellent()).unwrap_err();
        assert!(matches!(err, BookingError::NotEligible(_)));

        let booking = lifecycle
            .transition(&booking, &provider(), BookingAction::Complete)
            .unwrap()
            .after;
        assert!(gate.can_submit(&booking));

        let feedback = gate.submit(&booking, &customer(), excellent()).unwrap();
        assert_eq!(feedback.rating, 5);
        assert_eq!(feedback.service_quality, ServiceQuality::Excellent);
        assert_eq!(feedback.author_ref, "C1");

        assert!(!gate.can_submit(&booking));
        let err = gate.submit(&booking, &customer(), excellent()).unwrap_err();
        assert!(matches!(err, BookingError::NotEligible(_)));
    }

    #[test]
    fn cancelled_booking_never_opens() {
        let cancelled = BookingLifecycle::new()
            .transition(
                &pending("B1"),
                &customer(),
                BookingAction::Cancel { reason: None },
            )
            .unwrap()
            .after;
        assert!(!FeedbackGate::new().can_submit(&cancelled));
    }

    #[test]
    fn only_the_customer_may_review_with_a_valid_rating() {
        let mut completed = pending("B1");
        completed.status = BookingStatus::Completed;
        let mut gate = FeedbackGate::new();

        let err = gate.submit(&completed, &provider(), excellent()).unwrap_err();
        assert!(matches!(err, BookingError::UnauthorizedActor(_)));

        let mut bad = excellent();
        bad.rating = 9;
        let err = gate.submit(&completed, &customer(), bad).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        // rejected drafts leave the gate open
        assert!(gate.can_submit(&completed));
    }

    #[test]
    fn existing_feedback_closes_the_gate() {
        let mut completed = pending("B1");
        completed.status = BookingStatus::Completed;
        let gate = FeedbackGate::with_existing([BookingId::from("B1")]);
        assert!(!gate.can_submit(&completed));
    }
}
