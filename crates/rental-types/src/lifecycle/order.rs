use chrono::{DateTime, Utc};

use crate::domain::actor::{Actor, ActorRole};
use crate::domain::errors::BookingError;
use crate::domain::order::{NewOrder, Order, OrderId, OrderStatus};
use crate::lifecycle::attribution::CancellationAttributor;

/// Booked -> Order Canceled. Creation is gated on the payment outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderLifecycle {
    attributor: CancellationAttributor,
}

impl OrderLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(
        &self,
        customer: &Actor,
        draft: NewOrder,
        payment_approved: bool,
    ) -> Result<Order, BookingError> {
        if customer.role != ActorRole::Customer {
            return Err(BookingError::UnauthorizedActor(format!(
                "{} {} may not place orders",
                customer.role, customer.id
            )));
        }
        for (field, value) in [
            ("listing_ref", &draft.listing_ref),
            ("owner_ref", &draft.owner_ref),
            ("payment_method", &draft.payment_method),
        ] {
            if value.trim().is_empty() {
                return Err(BookingError::Validation(format!("{field} empty")));
            }
        }
        if !payment_approved {
            return Err(BookingError::Validation(
                "payment was not approved".into(),
            ));
        }
        let now = Utc::now();
        Ok(Order {
            id: OrderId::generate(),
            listing_ref: draft.listing_ref,
            owner_ref: draft.owner_ref,
            customer_ref: customer.id.clone(),
            payment_method: draft.payment_method,
            status: OrderStatus::Booked,
            created_at: now,
            updated_at: now,
            version: 0,
            cancellation: None,
        })
    }

    pub fn cancel(
        &self,
        order: &Order,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<Order, BookingError> {
        self.cancel_at(order, actor, reason, Utc::now())
    }

    pub fn cancel_at(
        &self,
        order: &Order,
        actor: &Actor,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Order, BookingError> {
        if order.status == OrderStatus::Canceled {
            return Err(BookingError::InvalidTransition(format!(
                "order {} is already {}",
                order.id, order.status
            )));
        }
        if !order.is_party(actor) {
            return Err(BookingError::UnauthorizedActor(format!(
                "{} {} is not a party to order {}",
                actor.role, actor.id, order.id
            )));
        }
        let cancellation = self.attributor.attribute(actor, reason, now)?;
        let mut next = order.clone();
        next.status = OrderStatus::Canceled;
        next.cancellation = Some(cancellation);
        next.updated_at = now;
        Ok(next)
    }
}
