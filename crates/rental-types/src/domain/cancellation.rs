use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit record of who cancelled a booking or order, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub canceled_by: String,
    pub canceled_account_id: String,
    pub canceled_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
