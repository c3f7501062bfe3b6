//! Per-visitor session store.
//!
//! This module provides an in-memory store mapping opaque session tokens to
//! each visitor's [`SessionState`]: their todo lists and pending flash
//! messages. Sessions use a sliding TTL, refreshed on every access.
//!
//! # Token Format
//!
//! Session tokens are 32 bytes of random data, base64-url encoded without
//! padding, resulting in 43 character tokens.
//!
//! # Thread Safety
//!
//! The [`SessionStore`] guards its map with an [`RwLock`]. Each call to
//! [`SessionStore::with_session`] holds the write lock for the whole
//! closure, so one request's mutation is applied atomically. Concurrent
//! requests for the same session are serialized in arrival order, last
//! write wins.
//!
//! # Example
//!
//! ```rust
//! use listkeeper_server::session::{SessionStore, SessionStoreConfig};
//!
//! let store = SessionStore::new(SessionStoreConfig::default());
//! let token = store.create_session().expect("store has capacity");
//!
//! store
//!     .with_session(&token, |session| {
//!         session.lists.create_list("Groceries");
//!     })
//!     .expect("session exists");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::repository::ListCollection;

/// Default idle TTL (24 hours).
pub const DEFAULT_TTL_SECS: u64 = 86_400;

/// Default maximum number of sessions.
pub const DEFAULT_MAX_CAPACITY: usize = 10_000;

/// Size of the random token in bytes.
const TOKEN_BYTES: usize = 32;

/// Expected length of base64-url encoded token (43 characters).
const TOKEN_LENGTH: usize = 43;

/// Errors that can occur during session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session store has reached maximum capacity.
    #[error("session store at maximum capacity ({max_capacity} sessions)")]
    AtCapacity {
        /// The maximum number of sessions allowed.
        max_capacity: usize,
    },

    /// The session token was not found or has expired.
    #[error("session not found or expired")]
    NotFound,
}

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    /// Maximum number of concurrent sessions.
    pub max_capacity: usize,

    /// Idle time after which a session expires.
    pub ttl: Duration,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }
}

impl SessionStoreConfig {
    pub fn new(max_capacity: usize, ttl: Duration) -> Self {
        Self { max_capacity, ttl }
    }
}

/// One-shot status messages shown on the next rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Flash {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Flash {
    pub fn is_empty(&self) -> bool {
        self.success.is_none() && self.error.is_none()
    }
}

/// Everything a visitor keeps between requests.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// The visitor's todo lists.
    pub lists: ListCollection,

    flash: Flash,
}

impl SessionState {
    /// Queues a success message for the next page.
    pub fn flash_success(&mut self, message: impl Into<String>) {
        self.flash.success = Some(message.into());
    }

    /// Queues an error message for the next page.
    pub fn flash_error(&mut self, message: impl Into<String>) {
        self.flash.error = Some(message.into());
    }

    /// Removes and returns the pending flash messages.
    pub fn take_flash(&mut self) -> Flash {
        std::mem::take(&mut self.flash)
    }
}

/// A stored session and its expiry bookkeeping.
#[derive(Debug)]
struct Session {
    state: SessionState,
    expires_at: Instant,
}

impl Session {
    fn new(ttl: Duration) -> Self {
        Self {
            state: SessionState::default(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn touch(&mut self, ttl: Duration) {
        self.expires_at = Instant::now() + ttl;
    }
}

/// Thread-safe in-memory session store.
///
/// The store maps session tokens to visitor state and enforces TTL and
/// capacity limits.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    config: SessionStoreConfig,
}

impl SessionStore {
    /// Creates a new session store with the given configuration.
    pub fn new(config: SessionStoreConfig) -> Self {
        debug!(
            max_capacity = config.max_capacity,
            ttl_secs = config.ttl.as_secs(),
            "Creating new session store"
        );
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Creates an empty session and returns its token.
    ///
    /// Expired sessions are swept first when the store is full, so a store
    /// holding only stale sessions still accepts new visitors.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AtCapacity`] if the store is full of live
    /// sessions.
    pub fn create_session(&self) -> Result<String, SessionError> {
        // Generate token first (outside of lock)
        let token = generate_session_token();

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);

        if sessions.len() >= self.config.max_capacity {
            sessions.retain(|_, session| !session.is_expired());
        }

        if sessions.len() >= self.config.max_capacity {
            warn!(
                capacity = sessions.len(),
                max_capacity = self.config.max_capacity,
                "Session store at capacity, rejecting new session"
            );
            return Err(SessionError::AtCapacity {
                max_capacity: self.config.max_capacity,
            });
        }

        trace!(ttl_secs = self.config.ttl.as_secs(), "Creating new session");
        sessions.insert(token.clone(), Session::new(self.config.ttl));

        Ok(token)
    }

    /// Returns `true` if `token` names a live session.
    pub fn contains(&self, token: &str) -> bool {
        if token.len() != TOKEN_LENGTH {
            return false;
        }
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(token).is_some_and(|session| !session.is_expired())
    }

    /// Runs `f` against the session's state under the store's write lock and
    /// refreshes the session's TTL.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the token is malformed, unknown,
    /// or expired. An expired session is removed.
    pub fn with_session<R>(
        &self,
        token: &str,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Result<R, SessionError> {
        if token.len() != TOKEN_LENGTH {
            trace!(token_len = token.len(), "Invalid token length");
            return Err(SessionError::NotFound);
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);

        let Some(session) = sessions.get_mut(token) else {
            trace!("Session token not found");
            return Err(SessionError::NotFound);
        };

        if session.is_expired() {
            sessions.remove(token);
            trace!("Removed expired session during access");
            return Err(SessionError::NotFound);
        }

        session.touch(self.config.ttl);
        Ok(f(&mut session.state))
    }

    /// Returns the current number of sessions, including expired ones not
    /// yet swept.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum capacity of the store.
    pub fn max_capacity(&self) -> usize {
        self.config.max_capacity
    }

    /// Removes all expired sessions from the store.
    ///
    /// Returns the number of sessions that were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let initial_len = sessions.len();

        sessions.retain(|_, session| !session.is_expired());

        let removed = initial_len - sessions.len();

        if removed > 0 {
            debug!(
                removed_count = removed,
                remaining_count = sessions.len(),
                "Cleaned up expired sessions"
            );
        }

        removed
    }

    /// Spawns a background task that periodically sweeps expired sessions.
    ///
    /// The task runs until the returned handle is aborted.
    pub fn spawn_cleanup_task(
        self: &Arc<Self>,
        cleanup_interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(cleanup_interval);

            loop {
                interval.tick().await;
                store.cleanup_expired();
            }
        })
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionStoreConfig::default())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.sessions.read().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("SessionStore")
            .field("session_count", &len)
            .field("config", &self.config)
            .finish()
    }
}

/// Generates a random session token.
fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
