use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::actor::{Actor, ActorRole};
use crate::domain::cancellation::Cancellation;
use crate::domain::errors::BookingError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Rental-post purchase status. The API spells the cancelled state
/// `"Order Canceled"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    #[serde(alias = "booked")]
    Booked,
    #[serde(rename = "Order Canceled", alias = "Canceled", alias = "Cancelled")]
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Booked => "Booked",
            OrderStatus::Canceled => "Order Canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Booked" | "booked" => Ok(OrderStatus::Booked),
            "Order Canceled" | "Canceled" | "Cancelled" => Ok(OrderStatus::Canceled),
            other => Err(BookingError::Validation(format!(
                "unknown order status {other:?}"
            ))),
        }
    }
}

/// Customer input for a new order; also the `POST /orders` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub listing_ref: String,
    pub owner_ref: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "OrderRecord", into = "OrderRecord")]
pub struct Order {
    pub id: OrderId,
    pub listing_ref: String,
    pub owner_ref: String,
    pub customer_ref: String,
    pub payment_method: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    pub cancellation: Option<Cancellation>,
}

impl Order {
    pub fn is_party(&self, actor: &Actor) -> bool {
        match actor.role {
            ActorRole::Customer => actor.id == self.customer_ref,
            ActorRole::Provider => actor.id == self.owner_ref,
        }
    }

    pub fn canceled_by(&self) -> Option<&str> {
        self.cancellation.as_ref().map(|c| c.canceled_by.as_str())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRecord {
    order_id: OrderId,
    listing_ref: String,
    owner_ref: String,
    customer_ref: String,
    payment_method: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    canceled_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    canceled_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    canceled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancel_reason: Option<String>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = BookingError;

    fn try_from(r: OrderRecord) -> Result<Self, Self::Error> {
        let cancellation = match r.status {
            OrderStatus::Booked => None,
            OrderStatus::Canceled => match (r.canceled_by, r.canceled_account_id) {
                (Some(canceled_by), Some(canceled_account_id)) => Some(Cancellation {
                    canceled_by,
                    canceled_account_id,
                    canceled_at: r.canceled_at.unwrap_or(r.updated_at),
                    reason: r.cancel_reason,
                }),
                _ => {
                    return Err(BookingError::Validation(format!(
                        "order {} is canceled without canceledBy",
                        r.order_id
                    )))
                }
            },
        };
        Ok(Order {
            id: r.order_id,
            listing_ref: r.listing_ref,
            owner_ref: r.owner_ref,
            customer_ref: r.customer_ref,
            payment_method: r.payment_method,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
            version: r.version,
            cancellation,
        })
    }
}

impl From<Order> for OrderRecord {
    fn from(o: Order) -> Self {
        let (canceled_by, canceled_account_id, canceled_at, cancel_reason) = match o.cancellation {
            Some(c) => (
                Some(c.canceled_by),
                Some(c.canceled_account_id),
                Some(c.canceled_at),
                c.reason,
            ),
            None => (None, None, None, None),
        };
        Self {
            order_id: o.id,
            listing_ref: o.listing_ref,
            owner_ref: o.owner_ref,
            customer_ref: o.customer_ref,
            payment_method: o.payment_method,
            status: o.status,
            created_at: o.created_at,
            updated_at: o.updated_at,
            version: o.version,
            canceled_by,
            canceled_account_id,
            canceled_at,
            cancel_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booked() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::from("O1"),
            listing_ref: "L1".into(),
            owner_ref: "P1".into(),
            customer_ref: "C1".into(),
            payment_method: "card".into(),
            status: OrderStatus::Booked,
            created_at: now,
            updated_at: now,
            version: 0,
            cancellation: None,
        }
    }

    #[test]
    fn canceled_status_uses_api_spelling() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Canceled).unwrap(),
            "\"Order Canceled\""
        );
        for raw in ["\"Order Canceled\"", "\"Canceled\"", "\"Cancelled\""] {
            let status: OrderStatus = serde_json::from_str(raw).unwrap();
            assert_eq!(status, OrderStatus::Canceled);
        }
        assert_eq!("Order Canceled".parse::<OrderStatus>(), Ok(OrderStatus::Canceled));
    }

    #[test]
    fn canceled_order_without_attribution_is_rejected() {
        let mut json = serde_json::to_value(booked()).unwrap();
        assert_eq!(json["orderId"], "O1");
        json["status"] = "Order Canceled".into();
        assert!(serde_json::from_value::<Order>(json.clone()).is_err());

        json["canceledBy"] = "Alice".into();
        json["canceledAccountId"] = "A100".into();
        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.canceled_by(), Some("Alice"));
    }

    #[test]
    fn parties_are_customer_and_listing_owner() {
        let order = booked();
        assert!(order.is_party(&Actor::customer("C1", "Alice")));
        assert!(order.is_party(&Actor::provider("P1", "Bob")));
        assert!(!order.is_party(&Actor::customer("P1", "Mallory")));
        assert!(!order.is_party(&Actor::provider("C1", "Mallory")));
    }
}
