use crate::domain::actor::Actor;

/// Resolves bearer tokens to actors. Read-only from the core's side.
pub trait SessionDirectory: Send + Sync + 'static {
    fn resolve(&self, token: &str) -> Option<Actor>;
}
