//! One automatic retry for transient failures.
//!
//! Transition requests carry `expectedVersion`, so replaying one whose first
//! attempt did land is answered with a conflict rather than applied twice.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rental_types::domain::booking::{Booking, BookingId, NewBooking};
use rental_types::domain::errors::BookingError;
use rental_types::domain::feedback::{Feedback, FeedbackDraft};
use rental_types::domain::order::{NewOrder, Order, OrderId};
use rental_types::ports::booking_api::{BookingApi, CancelRequest, ModifyRequest, OrderApi};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Pause before the single retry.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    /// First attempt plus at most one retry.
    pub const MAX_ATTEMPTS: u32 = 2;

    pub fn new(retry_delay: Duration) -> Self {
        Self { retry_delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(250),
        }
    }
}

pub async fn retry_transient<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, BookingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BookingError>>,
{
    for attempt in 1..=RetryPolicy::MAX_ATTEMPTS {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = operation_name, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && attempt < RetryPolicy::MAX_ATTEMPTS => {
                warn!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    retry_in_ms = policy.retry_delay.as_millis() as u64,
                    "transient failure, retrying"
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
            Err(err) => {
                warn!(operation = operation_name, attempt, error = %err, "request failed");
                return Err(err);
            }
        }
    }
    Err(BookingError::Internal(format!(
        "{operation_name}: retry loop exhausted"
    )))
}

/// Wraps an API port so every call gets the retry policy.
#[derive(Debug, Clone)]
pub struct RetryingApi<A> {
    inner: A,
    policy: RetryPolicy,
}

impl<A> RetryingApi<A> {
    pub fn new(inner: A) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    pub fn with_policy(inner: A, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: BookingApi> BookingApi for RetryingApi<A> {
    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        retry_transient(&self.policy, "list_bookings", || self.inner.list_bookings()).await
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Booking, BookingError> {
        retry_transient(&self.policy, "get_booking", || self.inner.get_booking(id)).await
    }

    async fn create_booking(&self, request: &NewBooking) -> Result<Booking, BookingError> {
        retry_transient(&self.policy, "create_booking", || {
            self.inner.create_booking(request)
        })
        .await
    }

    async fn confirm_booking(
        &self,
        id: &BookingId,
        expected_version: u64,
    ) -> Result<Booking, BookingError> {
        retry_transient(&self.policy, "confirm_booking", || {
            self.inner.confirm_booking(id, expected_version)
        })
        .await
    }

    async fn complete_booking(
        &self,
        id: &BookingId,
        expected_version: u64,
    ) -> Result<Booking, BookingError> {
        retry_transient(&self.policy, "complete_booking", || {
            self.inner.complete_booking(id, expected_version)
        })
        .await
    }

    async fn cancel_booking(
        &self,
        id: &BookingId,
        request: &CancelRequest,
    ) -> Result<Booking, BookingError> {
        retry_transient(&self.policy, "cancel_booking", || {
            self.inner.cancel_booking(id, request)
        })
        .await
    }

    async fn modify_booking(
        &self,
        id: &BookingId,
        request: &ModifyRequest,
    ) -> Result<Booking, BookingError> {
        retry_transient(&self.policy, "modify_booking", || {
            self.inner.modify_booking(id, request)
        })
        .await
    }

    async fn submit_feedback(
        &self,
        id: &BookingId,
        draft: &FeedbackDraft,
    ) -> Result<Feedback, BookingError> {
        retry_transient(&self.policy, "submit_feedback", || {
            self.inner.submit_feedback(id, draft)
        })
        .await
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, BookingError> {
        retry_transient(&self.policy, "list_feedback", || self.inner.list_feedback()).await
    }
}

#[async_trait]
impl<A: OrderApi> OrderApi for RetryingApi<A> {
    async fn list_orders(&self) -> Result<Vec<Order>, BookingError> {
        retry_transient(&self.policy, "list_orders", || self.inner.list_orders()).await
    }

    async fn create_order(&self, request: &NewOrder) -> Result<Order, BookingError> {
        retry_transient(&self.policy, "create_order", || self.inner.create_order(request)).await
    }

    async fn cancel_order(
        &self,
        id: &OrderId,
        request: &CancelRequest,
    ) -> Result<Order, BookingError> {
        retry_transient(&self.policy, "cancel_order", || {
            self.inner.cancel_order(id, request)
        })
        .await
    }
}
