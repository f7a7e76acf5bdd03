use anyhow::Context;
use axum::http::{header, HeaderMap};
use rental_types::domain::actor::{Actor, ClientSession};
use rental_types::ports::session::SessionDirectory;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::AppError;

/// Fixed token table, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticSessions {
    tokens: HashMap<String, Actor>,
}

impl StaticSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, token: impl Into<String>, actor: Actor) -> Self {
        self.tokens.insert(token.into(), actor);
        self
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let sessions: Vec<ClientSession> =
            serde_json::from_str(raw).context("invalid sessions json")?;
        Ok(Self {
            tokens: sessions.into_iter().map(|s| (s.token, s.actor)).collect(),
        })
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading sessions file {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl SessionDirectory for StaticSessions {
    fn resolve(&self, token: &str) -> Option<Actor> {
        self.tokens.get(token).cloned()
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn authenticate(sessions: &dyn SessionDirectory, headers: &HeaderMap) -> Result<Actor, AppError> {
    bearer_token(headers)
        .and_then(|token| sessions.resolve(token))
        .ok_or(AppError::Unauthenticated)
}
