use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::booking::BookingId;
use crate::domain::errors::BookingError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ServiceQuality {
    Poor,
    Good,
    Excellent,
}

impl ServiceQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceQuality::Poor => "Poor",
            ServiceQuality::Good => "Good",
            ServiceQuality::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for ServiceQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceQuality {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Poor" => Ok(ServiceQuality::Poor),
            "Good" => Ok(ServiceQuality::Good),
            "Excellent" => Ok(ServiceQuality::Excellent),
            other => Err(BookingError::Validation(format!(
                "unknown service quality {other:?}"
            ))),
        }
    }
}

/// What the customer fills in; the `POST /booking/feedback/{id}` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDraft {
    pub rating: u8,
    pub service_quality: ServiceQuality,
    #[serde(default)]
    pub message: String,
}

impl FeedbackDraft {
    pub fn validate(&self) -> Result<(), BookingError> {
        if !(1..=5).contains(&self.rating) {
            return Err(BookingError::Validation(format!(
                "rating {} outside 1..=5",
                self.rating
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub booking_id: BookingId,
    pub author_ref: String,
    pub rating: u8,
    pub service_quality: ServiceQuality,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
