use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::actor::{Actor, ActorRole};
use crate::domain::cancellation::Cancellation;
use crate::domain::errors::BookingError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
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

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "confirmed")]
    Confirmed,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "Canceled", alias = "cancelled", alias = "canceled")]
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" | "pending" => Ok(BookingStatus::Pending),
            "Confirmed" | "confirmed" => Ok(BookingStatus::Confirmed),
            "Completed" | "completed" => Ok(BookingStatus::Completed),
            "Cancelled" | "Canceled" | "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            other => Err(BookingError::Validation(format!(
                "unknown booking status {other:?}"
            ))),
        }
    }
}

/// Half-open service window on the booking date. `start < end` always holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "SlotBounds")]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Deserialize)]
struct SlotBounds {
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<SlotBounds> for TimeSlot {
    type Error = BookingError;

    fn try_from(bounds: SlotBounds) -> Result<Self, Self::Error> {
        TimeSlot::new(bounds.start, bounds.end)
    }
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, BookingError> {
        if start >= end {
            return Err(BookingError::Validation(format!(
                "time slot start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }
}

/// Customer input for a new booking; also the `POST /bookings` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub provider_ref: String,
    pub service_type: String,
    #[serde(default)]
    pub booking_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "BookingRecord", into = "BookingRecord")]
pub struct Booking {
    pub id: BookingId,
    pub status: BookingStatus,
    pub booking_date: Option<NaiveDate>,
    pub time_slot: TimeSlot,
    pub service_type: String,
    pub provider_ref: String,
    pub customer_ref: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    pub cancellation: Option<Cancellation>,
}

impl Booking {
    pub fn new(customer: &Actor, request: NewBooking) -> Result<Self, BookingError> {
        if customer.role != ActorRole::Customer {
            return Err(BookingError::UnauthorizedActor(format!(
                "{} {} may not create bookings",
                customer.role, customer.id
            )));
        }
        if request.provider_ref.trim().is_empty() {
            return Err(BookingError::Validation("provider_ref empty".into()));
        }
        if request.service_type.trim().is_empty() {
            return Err(BookingError::Validation("service_type empty".into()));
        }
        let time_slot = TimeSlot::new(request.start_time, request.end_time)?;
        let now = Utc::now();
        Ok(Self {
            id: BookingId::generate(),
            status: BookingStatus::Pending,
            booking_date: request.booking_date,
            time_slot,
            service_type: request.service_type,
            provider_ref: request.provider_ref,
            customer_ref: customer.id.clone(),
            created_at: now,
            updated_at: now,
            version: 0,
            cancellation: None,
        })
    }

    /// Instant used for "most recent first": the booked date at slot start,
    /// or the creation time when no date was chosen.
    pub fn recency(&self) -> NaiveDateTime {
        match self.booking_date {
            Some(date) => date.and_time(self.time_slot.start()),
            None => self.created_at.naive_utc(),
        }
    }

    pub fn is_party(&self, actor: &Actor) -> bool {
        self.is_provider(actor) || self.is_customer(actor)
    }

    pub fn is_provider(&self, actor: &Actor) -> bool {
        actor.role == ActorRole::Provider && actor.id == self.provider_ref
    }

    pub fn is_customer(&self, actor: &Actor) -> bool {
        actor.role == ActorRole::Customer && actor.id == self.customer_ref
    }
}

/// Shape of a booking on the wire.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRecord {
    booking_id: BookingId,
    status: BookingStatus,
    #[serde(default)]
    booking_date: Option<NaiveDate>,
    time_slot: TimeSlot,
    service_type: String,
    provider_ref: String,
    customer_ref: String,
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

impl TryFrom<BookingRecord> for Booking {
    type Error = BookingError;

    fn try_from(r: BookingRecord) -> Result<Self, Self::Error> {
        let cancellation = if r.status == BookingStatus::Cancelled {
            match (r.canceled_by, r.canceled_account_id) {
                (Some(canceled_by), Some(canceled_account_id)) => Some(Cancellation {
                    canceled_by,
                    canceled_account_id,
                    canceled_at: r.canceled_at.unwrap_or(r.updated_at),
                    reason: r.cancel_reason,
                }),
                _ => {
                    return Err(BookingError::Validation(format!(
                        "booking {} is cancelled without attribution",
                        r.booking_id
                    )))
                }
            }
        } else {
            None
        };
        Ok(Booking {
            id: r.booking_id,
            status: r.status,
            booking_date: r.booking_date,
            time_slot: r.time_slot,
            service_type: r.service_type,
            provider_ref: r.provider_ref,
            customer_ref: r.customer_ref,
            created_at: r.created_at,
            updated_at: r.updated_at,
            version: r.version,
            cancellation,
        })
    }
}

impl From<Booking> for BookingRecord {
    fn from(b: Booking) -> Self {
        let (canceled_by, canceled_account_id, canceled_at, cancel_reason) = match b.cancellation {
            Some(c) => (
                Some(c.canceled_by),
                Some(c.canceled_account_id),
                Some(c.canceled_at),
                c.reason,
            ),
            None => (None, None, None, None),
        };
        Self {
            booking_id: b.id,
            status: b.status,
            booking_date: b.booking_date,
            time_slot: b.time_slot,
            service_type: b.service_type,
            provider_ref: b.provider_ref,
            customer_ref: b.customer_ref,
            created_at: b.created_at,
            updated_at: b.updated_at,
            version: b.version,
            canceled_by,
            canceled_account_id,
            canceled_at,
            cancel_reason,
        }
    }
}
