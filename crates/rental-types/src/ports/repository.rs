use async_trait::async_trait;

use crate::domain::actor::Actor;
use crate::domain::booking::{Booking, BookingId};
use crate::domain::errors::BookingError;
use crate::domain::feedback::Feedback;
use crate::domain::order::{Order, OrderId};

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("db error: {0}")]
    DbError(String),
}

impl From<RepoError> for BookingError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(what) => BookingError::NotFound(what),
            RepoError::Conflict(msg) => BookingError::Conflict(msg),
            RepoError::DbError(msg) => BookingError::Internal(msg),
        }
    }
}

/// Stored versions guard every update: `update` only succeeds when the
/// stored version equals `expected_version`, and bumps it by one.
#[async_trait]
pub trait BookingRepository: Send + Sync + 'static {
    async fn create_booking(&self, booking: Booking) -> Result<Booking, RepoError>;
    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>, RepoError>;
    /// Bookings where `actor` is the provider or the customer, matched by role.
    async fn list_bookings_for(&self, actor: &Actor) -> Result<Vec<Booking>, RepoError>;
    async fn update_booking(
        &self,
        booking: Booking,
        expected_version: u64,
    ) -> Result<Booking, RepoError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError>;
    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, RepoError>;
    /// Orders where `actor` is the customer or, for a provider, the listing owner.
    async fn list_orders_for(&self, actor: &Actor) -> Result<Vec<Order>, RepoError>;
    async fn update_order(&self, order: Order, expected_version: u64)
        -> Result<Order, RepoError>;
}

#[async_trait]
pub trait FeedbackRepository: Send + Sync + 'static {
    /// Fails with `Conflict` when the booking already has feedback.
    async fn insert_feedback(&self, feedback: Feedback) -> Result<Feedback, RepoError>;
    async fn get_feedback(&self, booking_id: &BookingId) -> Result<Option<Feedback>, RepoError>;
    async fn list_feedback_by(&self, author_ref: &str) -> Result<Vec<Feedback>, RepoError>;
}

/// Everything the API server persists.
pub trait RentalRepository: BookingRepository + OrderRepository + FeedbackRepository {}

impl<T> RentalRepository for T where T: BookingRepository + OrderRepository + FeedbackRepository {}
