use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActorRole {
    Customer,
    Provider,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Customer => f.write_str("customer"),
            ActorRole::Provider => f.write_str("provider"),
        }
    }
}

/// The authenticated party performing an action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    pub role: ActorRole,
}

impl Actor {
    pub fn customer(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            account_id: None,
            role: ActorRole::Customer,
        }
    }

    pub fn provider(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            account_id: None,
            role: ActorRole::Provider,
        }
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn is_provider(&self) -> bool {
        self.role == ActorRole::Provider
    }
}

/// What the session store hands the client: who is acting and the bearer
/// token to present to the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientSession {
    pub token: String,
    pub actor: Actor,
}
