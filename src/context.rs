//! Session Context
//!
//! Holds the bearer credential for the lifetime of the application. It is
//! handed to every client at construction instead of being read from
//! ambient storage on each call, and logout clears it for all of them.

use std::sync::{Arc, RwLock};

/// Shared credential holder; clones see the same state
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session already holding a credential
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.sign_in(token);
        session
    }

    pub fn sign_in(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.into());
    }

    /// Current bearer credential, if signed in
    pub fn credential(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.credential().is_some()
    }

    /// Logout
    pub fn invalidate(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        if guard.take().is_some() {
            log::info!("session invalidated");
        }
    }
}
