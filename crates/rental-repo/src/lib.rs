#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use rental_types::domain::actor::Actor;
use rental_types::domain::booking::{Booking, BookingId};
use rental_types::domain::feedback::Feedback;
use rental_types::domain::order::{Order, OrderId};
use rental_types::ports::repository::{
    BookingRepository, FeedbackRepository, OrderRepository, RepoError,
};

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

// sqlite wins when both features are on.
#[cfg(feature = "sqlite")]
type Backend = sqlite::SqliteRepo;
#[cfg(all(feature = "memory", not(feature = "sqlite")))]
type Backend = memory::InMemoryRepo;

pub struct Repo {
    backend: Backend,
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            backend: memory::InMemoryRepo::new(),
        })
    }

    #[cfg(feature = "sqlite")]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://rental.db");
        let backend = sqlite::SqliteRepo::new(url).await?;
        Ok(Self { backend })
    }
}

#[async_trait]
impl BookingRepository for Repo {
    async fn create_booking(&self, booking: Booking) -> Result<Booking, RepoError> {
        self.backend.create_booking(booking).await
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>, RepoError> {
        self.backend.get_booking(id).await
    }

    async fn list_bookings_for(&self, actor: &Actor) -> Result<Vec<Booking>, RepoError> {
        self.backend.list_bookings_for(actor).await
    }

    async fn update_booking(
        &self,
        booking: Booking,
        expected_version: u64,
    ) -> Result<Booking, RepoError> {
        self.backend.update_booking(booking, expected_version).await
    }
}

#[async_trait]
impl OrderRepository for Repo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        self.backend.create_order(order).await
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, RepoError> {
        self.backend.get_order(id).await
    }

    async fn list_orders_for(&self, actor: &Actor) -> Result<Vec<Order>, RepoError> {
        self.backend.list_orders_for(actor).await
    }

    async fn update_order(&self, order: Order, expected_version: u64) -> Result<Order, RepoError> {
        self.backend.update_order(order, expected_version).await
    }
}

#[async_trait]
impl FeedbackRepository for Repo {
    async fn insert_feedback(&self, feedback: Feedback) -> Result<Feedback, RepoError> {
        self.backend.insert_feedback(feedback).await
    }

    async fn get_feedback(&self, booking_id: &BookingId) -> Result<Option<Feedback>, RepoError> {
        self.backend.get_feedback(booking_id).await
    }

    async fn list_feedback_by(&self, author_ref: &str) -> Result<Vec<Feedback>, RepoError> {
        self.backend.list_feedback_by(author_ref).await
    }
}
