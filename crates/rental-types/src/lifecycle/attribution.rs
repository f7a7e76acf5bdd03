use chrono::{DateTime, Utc};

use crate::domain::actor::Actor;
use crate::domain::cancellation::Cancellation;
use crate::domain::errors::BookingError;

/// Resolves the audit attribution for a cancellation. A cancellation without
/// a resolvable actor name and account id is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationAttributor;

impl CancellationAttributor {
    pub fn attribute(
        &self,
        actor: &Actor,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Cancellation, BookingError> {
        let name = actor.name.trim();
        if name.is_empty() {
            return Err(BookingError::Validation(format!(
                "actor {} has no display name to attribute",
                actor.id
            )));
        }
        let account_id = actor
            .account_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                BookingError::Validation(format!("actor {} has no account id", actor.id))
            })?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Ok(Cancellation {
            canceled_by: name.to_string(),
            canceled_account_id: account_id.to_string(),
            canceled_at: at,
            reason,
        })
    }
}
