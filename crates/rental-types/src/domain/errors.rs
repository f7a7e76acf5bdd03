use thiserror::Error;

/// Every failure the booking core reports. Variants carry a human readable
/// message; `kind()` is the stable tag used on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unauthorized actor: {0}")]
    UnauthorizedActor(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not eligible: {0}")]
    NotEligible(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "validation",
            BookingError::UnauthorizedActor(_) => "unauthorized_actor",
            BookingError::InvalidTransition(_) => "invalid_transition",
            BookingError::NotFound(_) => "not_found",
            BookingError::Conflict(_) => "conflict",
            BookingError::NotEligible(_) => "not_eligible",
            BookingError::Transient(_) => "transient",
            BookingError::Internal(_) => "internal",
        }
    }

    /// Rebuilds an error from its wire tag. Unknown tags become `Internal`.
    pub fn from_kind(kind: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            "validation" => BookingError::Validation(message),
            "unauthorized_actor" | "unauthenticated" => BookingError::UnauthorizedActor(message),
            "invalid_transition" => BookingError::InvalidTransition(message),
            "not_found" => BookingError::NotFound(message),
            "conflict" => BookingError::Conflict(message),
            "not_eligible" => BookingError::NotEligible(message),
            "transient" => BookingError::Transient(message),
            _ => BookingError::Internal(message),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, BookingError::Transient(_))
    }

    /// The local snapshot is stale and must be refetched before retrying.
    pub fn requires_refetch(&self) -> bool {
        matches!(
            self,
            BookingError::InvalidTransition(_)
                | BookingError::Conflict(_)
                | BookingError::NotFound(_)
        )
    }
}
