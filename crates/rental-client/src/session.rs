use rental_types::domain::actor::Actor;
use rental_types::domain::booking::{Booking, BookingId, NewBooking};
use rental_types::domain::errors::BookingError;
use rental_types::domain::feedback::{Feedback, FeedbackDraft};
use rental_types::domain::order::{NewOrder, Order, OrderId};
use rental_types::lifecycle::{
    BookingAction, BookingLifecycle, BookingStore, FeedbackGate, OrderLifecycle, StatusGroup,
    Transition,
};
use rental_types::ports::booking_api::{BookingApi, CancelRequest, ModifyRequest, OrderApi};
use rental_types::ports::payment::PaymentGateway;

use crate::cancel::CancellationToken;
use crate::poll::{poll_with_backoff, PollConfig, PollOutcome};

/// One actor's view of their bookings. Transitions are checked locally,
/// shown optimistically, and only kept once the server acknowledges them.
pub struct BookingSession<A: BookingApi> {
    api: A,
    actor: Actor,
    lifecycle: BookingLifecycle,
    store: BookingStore,
    gate: FeedbackGate,
    poll: PollConfig,
}

impl<A: BookingApi> BookingSession<A> {
    pub fn new(api: A, actor: Actor) -> Self {
        Self {
            api,
            actor,
            lifecycle: BookingLifecycle::new(),
            store: BookingStore::new(),
            gate: FeedbackGate::new(),
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Current snapshot; cloning it is cheap and later updates never touch it.
    pub fn store(&self) -> &BookingStore {
        &self.store
    }

    pub async fn refresh(&mut self) -> Result<&BookingStore, BookingError> {
        let bookings = self.api.list_bookings().await?;
        let feedback = self.api.list_feedback().await?;
        self.store = self.store.replace_all(bookings);
        self.gate = FeedbackGate::with_existing(feedback.into_iter().map(|f| f.booking_id));
        tracing::debug!(
            actor = %self.actor.id,
            bookings = self.store.len(),
            revision = self.store.revision(),
            "bookings refreshed"
        );
        Ok(&self.store)
    }

    pub async fn create(&mut self, request: NewBooking) -> Result<Booking, BookingError> {
        Booking::new(&self.actor, request.clone())?;
        let created = self.api.create_booking(&request).await?;
        self.store = self.store.insert(created.clone());
        Ok(created)
    }

    pub async fn confirm(&mut self, id: &BookingId) -> Result<Booking, BookingError> {
        self.apply(id, BookingAction::Confirm).await
    }

    pub async fn complete(&mut self, id: &BookingId) -> Result<Booking, BookingError> {
        self.apply(id, BookingAction::Complete).await
    }

    pub async fn cancel(
        &mut self,
        id: &BookingId,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        self.apply(id, BookingAction::Cancel { reason }).await
    }

    pub async fn modify(
        &mut self,
        id: &BookingId,
        booking_date: chrono::NaiveDate,
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
    ) -> Result<Booking, BookingError> {
        self.apply(
            id,
            BookingAction::Modify {
                booking_date,
                start,
                end,
            },
        )
        .await
    }

    async fn apply(
        &mut self,
        id: &BookingId,
        action: BookingAction,
    ) -> Result<Booking, BookingError> {
        let current = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))?;
        let transition = self.lifecycle.transition(&current, &self.actor, action)?;
        self.store = self.store.apply_transition(id, &transition)?;

        match self.send(&current, &transition).await {
            Ok(acked) => {
                self.store = self.store.replace(acked.clone())?;
                Ok(acked)
            }
            Err(err) => {
                tracing::warn!(
                    booking_id = %id,
                    action = transition.action.name(),
                    error = %err,
                    "server rejected transition, rolling back"
                );
                self.store = self.store.apply_transition(id, &transition.reverted())?;
                if err.requires_refetch() {
                    if let Err(refetch) = self.refresh().await {
                        tracing::warn!(error = %refetch, "refetch after rejection failed");
                    }
                }
                Err(err)
            }
        }
    }

    async fn send(&self, current: &Booking, transition: &Transition) -> Result<Booking, BookingError> {
        let id = &current.id;
        let expected_version = current.version;
        match &transition.action {
            BookingAction::Confirm => self.api.confirm_booking(id, expected_version).await,
            BookingAction::Complete => self.api.complete_booking(id, expected_version).await,
            BookingAction::Cancel { reason } => {
                let request = CancelRequest {
                    expected_version,
                    reason: reason.clone(),
                };
                self.api.cancel_booking(id, &request).await
            }
            BookingAction::Modify {
                booking_date,
                start,
                end,
            } => {
                let request = ModifyRequest {
                    expected_version,
                    booking_date: *booking_date,
                    start_time: *start,
                    end_time: *end,
                };
                self.api.modify_booking(id, &request).await
            }
        }
    }

    pub fn can_submit_feedback(&self, id: &BookingId) -> bool {
        self.store
            .get(id)
            .map(|b| self.gate.can_submit(b))
            .unwrap_or(false)
    }

    pub async fn submit_feedback(
        &mut self,
        id: &BookingId,
        draft: FeedbackDraft,
    ) -> Result<Feedback, BookingError> {
        let booking = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))?;
        // Dry run on a copy so a rejected submission leaves the gate open.
        self.gate.clone().submit(&booking, &self.actor, draft.clone())?;

        match self.api.submit_feedback(id, &draft).await {
            Ok(feedback) => {
                self.gate.record(&feedback);
                Ok(feedback)
            }
            Err(err) => {
                if err.requires_refetch() || matches!(err, BookingError::NotEligible(_)) {
                    if let Err(refetch) = self.refresh().await {
                        tracing::warn!(error = %refetch, "refetch after rejection failed");
                    }
                }
                Err(err)
            }
        }
    }

    /// Polls one booking until `until` holds for it, the poll budget runs
    /// out, or `token` is cancelled. A ready booking is merged into the store.
    pub async fn watch_booking<F>(
        &mut self,
        id: &BookingId,
        token: &CancellationToken,
        until: F,
    ) -> Result<PollOutcome<Booking>, BookingError>
    where
        F: Fn(&Booking) -> bool,
    {
        let api = &self.api;
        let until = &until;
        let outcome = poll_with_backoff(&self.poll, token, || async move {
            let booking = api.get_booking(id).await?;
            Ok::<_, BookingError>(until(&booking).then_some(booking))
        })
        .await?;
        if let PollOutcome::Ready(booking) = &outcome {
            self.store = self.store.insert(booking.clone());
        }
        Ok(outcome)
    }
}

/// One actor's view of their orders.
pub struct OrderSession<A: OrderApi, P: PaymentGateway> {
    api: A,
    payments: P,
    actor: Actor,
    lifecycle: OrderLifecycle,
    orders: Vec<Order>,
}

impl<A: OrderApi, P: PaymentGateway> OrderSession<A, P> {
    pub fn new(api: A, payments: P, actor: Actor) -> Self {
        Self {
            api,
            payments,
            actor,
            lifecycle: OrderLifecycle::new(),
            orders: Vec::new(),
        }
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub async fn refresh(&mut self) -> Result<&[Order], BookingError> {
        let mut orders = self.api.list_orders().await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.orders = orders;
        Ok(&self.orders)
    }

    pub async fn place_order(&mut self, draft: NewOrder) -> Result<Order, BookingError> {
        let approved = self.payments.authorize(&self.actor, &draft).await?;
        self.lifecycle.place(&self.actor, draft.clone(), approved)?;
        let order = self.api.create_order(&draft).await?;
        tracing::info!(order_id = %order.id, "order placed");
        self.orders.insert(0, order.clone());
        Ok(order)
    }

    pub async fn cancel_order(
        &mut self,
        id: &OrderId,
        reason: Option<String>,
    ) -> Result<Order, BookingError> {
        let current = self
            .orders
            .iter()
            .find(|o| &o.id == id)
            .cloned()
            .ok_or_else(|| BookingError::NotFound(format!("order {id}")))?;
        self.lifecycle.cancel(&current, &self.actor, reason.clone())?;

        let request = CancelRequest {
            expected_version: current.version,
            reason,
        };
        match self.api.cancel_order(id, &request).await {
            Ok(canceled) => {
                if let Some(slot) = self.orders.iter_mut().find(|o| &o.id == id) {
                    *slot = canceled.clone();
                }
                Ok(canceled)
            }
            Err(err) => {
                if err.requires_refetch() {
                    if let Err(refetch) = self.refresh().await {
                        tracing::warn!(error = %refetch, "refetch after rejection failed");
                    }
                }
                Err(err)
            }
        }
    }

    pub fn filter_by_status_group(&self, group: StatusGroup) -> Vec<Order> {
        group.filter_orders(&self.orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{alice, bob, new_booking, FakeBookingApi, FakeOrderApi, FixedPayments};
    use chrono::{NaiveDate, NaiveTime};
    use rental_types::domain::booking::BookingStatus;
    use rental_types::domain::feedback::ServiceQuality;
    use rental_types::domain::order::OrderStatus;
    use std::time::Duration;

    async fn provider_session() -> (BookingSession<FakeBookingApi>, BookingId) {
        let api = FakeBookingApi::seeded();
        let id = api.booking_ids()[0].clone();
        let mut session = BookingSession::new(api, bob());
        session.refresh().await.unwrap();
        (session, id)
    }

    #[tokio::test]
    async fn acknowledged_transition_replaces_optimistic_copy() {
        let (mut session, id) = provider_session().await;
        let before = session.store().clone();

        let confirmed = session.confirm(&id).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.version, 1);
        assert_eq!(session.store().get(&id), Some(&confirmed));

        // Earlier snapshots are untouched.
        assert_eq!(before.get(&id).unwrap().status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn rejected_transition_rolls_back_and_refetches() {
        let (mut session, id) = provider_session().await;

        // Someone else cancelled first; the local copy is stale.
        let mut elsewhere = session.api().stored(&id).unwrap();
        elsewhere.status = BookingStatus::Cancelled;
        elsewhere.cancellation = Some(
            rental_types::lifecycle::CancellationAttributor
                .attribute(&alice(), None, chrono::Utc::now())
                .unwrap(),
        );
        elsewhere.version = 1;
        session.api().overwrite(elsewhere);

        let err = session.confirm(&id).await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));
        let refreshed = session.store().get(&id).unwrap();
        assert_eq!(refreshed.status, BookingStatus::Cancelled);
        assert_eq!(refreshed.version, 1);
    }

    #[tokio::test]
    async fn transient_rejection_rolls_back_without_refetch() {
        let (mut session, id) = provider_session().await;
        let calls_before = session.api().calls();
        session
            .api()
            .fail_next(BookingError::Transient("connection reset".into()));

        let err = session.confirm(&id).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(session.store().get(&id).unwrap().status, BookingStatus::Pending);
        assert_eq!(session.api().calls(), calls_before + 1);
    }

    #[tokio::test]
    async fn local_rules_reject_before_any_request() {
        let (mut session, id) = provider_session().await;
        let calls_before = session.api().calls();

        let err = session.complete(&id).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition(_)));
        let err = session
            .modify(
                &id,
                NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
        assert_eq!(session.api().calls(), calls_before);
    }

    #[tokio::test]
    async fn cancel_records_who_cancelled() {
        let (mut session, id) = provider_session().await;
        let cancelled = session
            .cancel(&id, Some("provider unavailable".into()))
            .await
            .unwrap();
        let c = cancelled.cancellation.unwrap();
        assert_eq!(c.canceled_by, "Bob");
        assert_eq!(c.canceled_account_id, "A200");
        assert_eq!(
            session.store().filter_by_status_group(StatusGroup::Cancelled).len(),
            1
        );
    }

    #[tokio::test]
    async fn feedback_gate_closes_after_submission() {
        let api = FakeBookingApi::new(alice());
        let mut booking = Booking::new(&alice(), new_booking()).unwrap();
        booking.status = BookingStatus::Completed;
        booking.version = 2;
        let id = booking.id.clone();
        api.seed(booking);

        let mut session = BookingSession::new(api, alice());
        session.refresh().await.unwrap();
        assert!(session.can_submit_feedback(&id));

        let draft = FeedbackDraft {
            rating: 5,
            service_quality: ServiceQuality::Excellent,
            message: String::new(),
        };
        let bad = FeedbackDraft {
            rating: 0,
            ..draft.clone()
        };
        assert!(matches!(
            session.submit_feedback(&id, bad).await,
            Err(BookingError::Validation(_))
        ));
        assert!(session.can_submit_feedback(&id));

        session.submit_feedback(&id, draft.clone()).await.unwrap();
        assert!(!session.can_submit_feedback(&id));
        assert!(matches!(
            session.submit_feedback(&id, draft).await,
            Err(BookingError::NotEligible(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn watch_returns_once_condition_holds() {
        let (session, id) = provider_session().await;
        let mut session = session.with_poll_config(PollConfig {
            interval: Duration::from_secs(1),
            backoff_multiplier: 1.0,
            max_interval: Duration::from_secs(1),
            max_duration: Duration::from_secs(5),
        });

        let outcome = session
            .watch_booking(&id, &CancellationToken::new(), |b| {
                b.status == BookingStatus::Confirmed
            })
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::TimedOut);

        session.confirm(&id).await.unwrap();
        let outcome = session
            .watch_booking(&id, &CancellationToken::new(), |b| {
                b.status == BookingStatus::Confirmed
            })
            .await
            .unwrap();
        assert!(matches!(outcome, PollOutcome::Ready(b) if b.version == 1));
    }

    #[tokio::test]
    async fn order_placement_is_gated_on_payment() {
        let mut declined = OrderSession::new(FakeOrderApi::new(alice()), FixedPayments(false), alice());
        let draft = NewOrder {
            listing_ref: "L1".into(),
            owner_ref: "P1".into(),
            payment_method: "card".into(),
        };
        assert!(matches!(
            declined.place_order(draft.clone()).await,
            Err(BookingError::Validation(_))
        ));
        assert_eq!(declined.orders().len(), 0);
        assert_eq!(declined.api.calls(), 0);

        let mut session = OrderSession::new(FakeOrderApi::new(alice()), FixedPayments(true), alice());
        let order = session.place_order(draft).await.unwrap();
        assert_eq!(order.status, OrderStatus::Booked);

        let canceled = session.cancel_order(&order.id, None).await.unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(canceled.canceled_by(), Some("Alice"));
        assert_eq!(
            canceled.cancellation.as_ref().map(|c| c.canceled_account_id.as_str()),
            Some("A100")
        );
        assert_eq!(session.filter_by_status_group(StatusGroup::Cancelled).len(), 1);
        assert!(session.filter_by_status_group(StatusGroup::Booked).is_empty());

        // Already canceled: rejected locally.
        let calls = session.api.calls();
        assert!(matches!(
            session.cancel_order(&order.id, None).await,
            Err(BookingError::InvalidTransition(_))
        ));
        assert_eq!(session.api.calls(), calls);
    }
}
