//! Session token scoping one suggest→select sequence.

use std::{
    fmt,
    sync::{PoisonError, RwLock},
};

use tracing::debug;
use uuid::Uuid;

/// Opaque identifier attached to every suggestion call until the next selection completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Holds the current token. Rotation is the only mutation.
#[derive(Debug, Default)]
pub struct SessionManager {
    token: RwLock<SessionToken>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SessionToken {
        *self.token.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the token with a fresh one and return it.
    pub fn rotate(&self) -> SessionToken {
        let fresh = SessionToken::new();
        let mut token = self.token.write().unwrap_or_else(PoisonError::into_inner);
        debug!(old = %*token, new = %fresh, "Rotating session token");
        *token = fresh;
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_stable_until_rotated() {
        let manager = SessionManager::new();
        let first = manager.current();
        assert_eq!(manager.current(), first);

        let rotated = manager.rotate();
        assert_ne!(rotated, first);
        assert_eq!(manager.current(), rotated);
    }

    #[test]
    fn test_token_renders_as_uuid() {
        let token = SessionToken::new().to_string();
        assert_eq!(token.len(), 36);
        assert!(Uuid::parse_str(&token).is_ok());
    }
}
