use crate::errors::AppError;
use rental_types::domain::actor::Actor;
use rental_types::domain::errors::BookingError;
use rental_types::domain::order::{NewOrder, Order, OrderId};
use rental_types::lifecycle::OrderLifecycle;
use rental_types::ports::repository::RentalRepository;
use std::sync::Arc;

pub struct OrderService<R: RentalRepository> {
    repo: Arc<R>,
    lifecycle: OrderLifecycle,
}

impl<R: RentalRepository> OrderService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            lifecycle: OrderLifecycle::new(),
        }
    }

    /// Records an order the client has already settled with the payment
    /// gateway; only approved payments are ever submitted.
    pub async fn create_order(&self, actor: &Actor, draft: NewOrder) -> Result<Order, AppError> {
        let order = self.lifecycle.place(actor, draft, true)?;
        let order = self.repo.create_order(order).await?;
        tracing::info!(order_id = %order.id, customer = %actor.id, "order booked");
        Ok(order)
    }

    pub async fn list_orders(&self, actor: &Actor) -> Result<Vec<Order>, AppError> {
        let mut orders = self.repo.list_orders_for(actor).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(orders)
    }

    pub async fn get_order(&self, actor: &Actor, id: &OrderId) -> Result<Order, AppError> {
        match self.repo.get_order(id).await? {
            Some(o) if o.is_party(actor) => Ok(o),
            _ => Err(BookingError::NotFound(format!("order {}", id)).into()),
        }
    }

    pub async fn cancel_order(
        &self,
        actor: &Actor,
        id: &OrderId,
        expected_version: u64,
        reason: Option<String>,
    ) -> Result<Order, AppError> {
        let current = self.get_order(actor, id).await?;
        if current.version != expected_version {
            return Err(BookingError::Conflict(format!(
                "order {} is at version {}, request expected {}",
                id, current.version, expected_version
            ))
            .into());
        }
        let canceled = self.lifecycle.cancel(&current, actor, reason)?;
        let stored = self.repo.update_order(canceled, expected_version).await?;
        tracing::info!(
            order_id = %id,
            canceled_by = stored.canceled_by().unwrap_or_default(),
            version = stored.version,
            "order canceled"
        );
        Ok(stored)
    }
}
