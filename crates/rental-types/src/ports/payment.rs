use async_trait::async_trait;

use crate::domain::actor::Actor;
use crate::domain::errors::BookingError;
use crate::domain::order::NewOrder;

/// Opaque payment provider. Only the yes/no outcome feeds order creation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, customer: &Actor, order: &NewOrder) -> Result<bool, BookingError>;
}
