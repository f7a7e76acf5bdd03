use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rental_types::domain::actor::Actor;
use rental_types::domain::booking::{Booking, BookingId};
use rental_types::domain::feedback::Feedback;
use rental_types::domain::order::{Order, OrderId};
use rental_types::ports::repository::{
    BookingRepository, FeedbackRepository, OrderRepository, RepoError,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub bookings: Arc<DashMap<BookingId, Booking>>,
    pub orders: Arc<DashMap<OrderId, Order>>,
    pub feedback: Arc<DashMap<BookingId, Feedback>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            bookings: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            feedback: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn version_conflict(what: String, expected: u64, actual: u64) -> RepoError {
    RepoError::Conflict(format!(
        "{what} is at version {actual}, request expected {expected}"
    ))
}

#[async_trait]
impl BookingRepository for InMemoryRepo {
    async fn create_booking(&self, booking: Booking) -> Result<Booking, RepoError> {
        match self.bookings.entry(booking.id.clone()) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!(
                "booking {} already exists",
                booking.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(booking.clone());
                Ok(booking)
            }
        }
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>, RepoError> {
        Ok(self.bookings.get(id).map(|r| r.clone()))
    }

    async fn list_bookings_for(&self, actor: &Actor) -> Result<Vec<Booking>, RepoError> {
        Ok(self
            .bookings
            .iter()
            .filter(|kv| kv.is_party(actor))
            .map(|kv| kv.value().clone())
            .collect())
    }

    async fn update_booking(
        &self,
        mut booking: Booking,
        expected_version: u64,
    ) -> Result<Booking, RepoError> {
        // The entry guard holds the shard lock across check and write.
        let mut stored = self
            .bookings
            .get_mut(&booking.id)
            .ok_or_else(|| RepoError::NotFound(format!("booking {}", booking.id)))?;
        if stored.version != expected_version {
            return Err(version_conflict(
                format!("booking {}", booking.id),
                expected_version,
                stored.version,
            ));
        }
        booking.version = expected_version + 1;
        *stored = booking.clone();
        Ok(booking)
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        match self.orders.entry(order.id.clone()) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!(
                "order {} already exists",
                order.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(order)
            }
        }
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(id).map(|r| r.clone()))
    }

    async fn list_orders_for(&self, actor: &Actor) -> Result<Vec<Order>, RepoError> {
        Ok(self
            .orders
            .iter()
            .filter(|kv| kv.is_party(actor))
            .map(|kv| kv.value().clone())
            .collect())
    }

    async fn update_order(
        &self,
        mut order: Order,
        expected_version: u64,
    ) -> Result<Order, RepoError> {
        let mut stored = self
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| RepoError::NotFound(format!("order {}", order.id)))?;
        if stored.version != expected_version {
            return Err(version_conflict(
                format!("order {}", order.id),
                expected_version,
                stored.version,
            ));
        }
        order.version = expected_version + 1;
        *stored = order.clone();
        Ok(order)
    }
}

#[async_trait]
impl FeedbackRepository for InMemoryRepo {
    async fn insert_feedback(&self, feedback: Feedback) -> Result<Feedback, RepoError> {
        match self.feedback.entry(feedback.booking_id.clone()) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!(
                "booking {} already has feedback",
                feedback.booking_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(feedback.clone());
                Ok(feedback)
            }
        }
    }

    async fn get_feedback(&self, booking_id: &BookingId) -> Result<Option<Feedback>, RepoError> {
        Ok(self.feedback.get(booking_id).map(|r| r.clone()))
    }

    async fn list_feedback_by(&self, author_ref: &str) -> Result<Vec<Feedback>, RepoError> {
        Ok(self
            .feedback
            .iter()
            .filter(|kv| kv.author_ref == author_ref)
            .map(|kv| kv.value().clone())
            .collect())
    }
}
