use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::booking::{Booking, BookingId, NewBooking};
use crate::domain::errors::BookingError;
use crate::domain::feedback::{Feedback, FeedbackDraft};
use crate::domain::order::{NewOrder, Order, OrderId};

/// Body of confirm/complete requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionedRequest {
    pub expected_version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub expected_version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    pub expected_version: u64,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Error payload the API answers with on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub error: String,
    pub kind: String,
}

impl From<&BookingError> for ApiErrorBody {
    fn from(e: &BookingError) -> Self {
        Self {
            error: e.to_string(),
            kind: e.kind().to_string(),
        }
    }
}

/// Remote booking endpoints, as seen by the client workflows.
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError>;
    async fn get_booking(&self, id: &BookingId) -> Result<Booking, BookingError>;
    async fn create_booking(&self, request: &NewBooking) -> Result<Booking, BookingError>;
    async fn confirm_booking(
        &self,
        id: &BookingId,
        expected_version: u64,
    ) -> Result<Booking, BookingError>;
    async fn complete_booking(
        &self,
        id: &BookingId,
        expected_version: u64,
    ) -> Result<Booking, BookingError>;
    async fn cancel_booking(
        &self,
        id: &BookingId,
        request: &CancelRequest,
    ) -> Result<Booking, BookingError>;
    async fn modify_booking(
        &self,
        id: &BookingId,
        request: &ModifyRequest,
    ) -> Result<Booking, BookingError>;
    async fn submit_feedback(
        &self,
        id: &BookingId,
        draft: &FeedbackDraft,
    ) -> Result<Feedback, BookingError>;
    async fn list_feedback(&self) -> Result<Vec<Feedback>, BookingError>;
}

/// Remote order endpoints.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn list_orders(&self) -> Result<Vec<Order>, BookingError>;
    async fn create_order(&self, request: &NewOrder) -> Result<Order, BookingError>;
    async fn cancel_order(
        &self,
        id: &OrderId,
        request: &CancelRequest,
    ) -> Result<Order, BookingError>;
}
