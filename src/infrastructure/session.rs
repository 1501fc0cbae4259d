//! Session lookup.
//!
//! Authentication itself happens elsewhere; the registry only maps bearer
//! tokens issued by that provider to the user they belong to.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::domain::UserId;
use crate::infrastructure::ConfigurationError;

/// Token to user mapping, replaceable at runtime without locking readers.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: ArcSwap<HashMap<String, UserId>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `token=user-uuid` pairs separated by commas.
    ///
    /// Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidSessionEntry` for an entry without
    /// `=`, with an empty token, or with a malformed user id.
    pub fn parse(entries: &str) -> Result<Self, ConfigurationError> {
        let mut sessions = HashMap::new();
        for entry in entries.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let invalid = || ConfigurationError::InvalidSessionEntry(entry.to_string());
            let (token, user) = entry.split_once('=').ok_or_else(invalid)?;
            let token = token.trim();
            if token.is_empty() {
                return Err(invalid());
            }
            let user: UserId = user.trim().parse().map_err(|_| invalid())?;
            sessions.insert(token.to_string(), user);
        }

        Ok(Self {
            sessions: ArcSwap::from_pointee(sessions),
        })
    }

    /// Reads `SESSION_TOKENS`; an unset variable yields an empty registry.
    ///
    /// # Errors
    ///
    /// See [`SessionRegistry::parse`].
    pub fn from_env() -> Result<Self, ConfigurationError> {
        env::var("SESSION_TOKENS").map_or_else(|_| Ok(Self::new()), |value| Self::parse(&value))
    }

    /// Registers or replaces a session.
    pub fn insert(&self, token: impl Into<String>, user: UserId) {
        let token = token.into();
        self.sessions.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(token.clone(), user);
            Arc::new(next)
        });
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.remove(token);
            Arc::new(next)
        });
    }

    /// Returns the user a token belongs to.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<UserId> {
        self.sessions.load().get(token).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_parse_reads_pairs() {
        let alice = UserId::generate();
        let bob = UserId::generate();

        let registry = SessionRegistry::parse(&format!(" alpha={alice}, ,beta = {bob} ")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("alpha"), Some(alice));
        assert_eq!(registry.resolve("beta"), Some(bob));
        assert_eq!(registry.resolve("gamma"), None);
    }

    #[rstest]
    #[case("no-separator")]
    #[case("=0190a4c2-0000-7000-8000-000000000000")]
    #[case("token=not-a-uuid")]
    fn test_parse_rejects_malformed_entry(#[case] entry: &str) {
        assert_eq!(
            SessionRegistry::parse(entry).unwrap_err(),
            ConfigurationError::InvalidSessionEntry(entry.to_string())
        );
    }

    #[rstest]
    fn test_empty_input_gives_empty_registry() {
        assert!(SessionRegistry::parse("").unwrap().is_empty());
    }

    #[rstest]
    fn test_insert_and_revoke() {
        let registry = SessionRegistry::new();
        let user = UserId::generate();

        registry.insert("token", user);
        assert_eq!(registry.resolve("token"), Some(user));

        registry.revoke("token");
        assert!(registry.resolve("token").is_none());
    }
}
