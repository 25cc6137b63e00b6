//! Session Ports (Driven Ports)
//!
//! Persistence and mutual exclusion for the request governor. Implementations
//! must be shareable across processes that trade on the same account.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::rate_limit::SessionInfo;

/// Session persistence error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing a session file failed.
    #[error("Session I/O error on {path}: {message}")]
    Io {
        /// File path.
        path: String,
        /// Error details.
        message: String,
    },

    /// Stored data could not be decoded.
    #[error("Corrupt session data in {path}: {message}")]
    Corrupt {
        /// File path.
        path: String,
        /// Error details.
        message: String,
    },

    /// The session lock could not be acquired.
    #[error("Session lock unavailable: {message}")]
    Lock {
        /// Error details.
        message: String,
    },
}

/// Persisted governor state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Completion time of the last request, `None` before the first one.
    async fn last_request(&self) -> Result<Option<DateTime<Utc>>, SessionError>;

    /// Record the completion time of a request.
    async fn set_last_request(&self, at: DateTime<Utc>) -> Result<(), SessionError>;

    /// Read the endpoint table and cooldown flag.
    async fn load_info(&self) -> Result<SessionInfo, SessionError>;

    /// Replace the endpoint table and cooldown flag.
    async fn save_info(&self, info: &SessionInfo) -> Result<(), SessionError>;
}

/// Proof of holding the session lock. Dropping it releases the lock.
pub struct SessionGuard(Box<dyn Send + Sync>);

impl SessionGuard {
    /// Wrap whatever releases the lock on drop.
    #[must_use]
    pub fn new(inner: impl Send + Sync + 'static) -> Self {
        Self(Box::new(inner))
    }
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionGuard")
    }
}

/// Mutual exclusion over the governor's critical section.
#[async_trait]
pub trait SessionLock: Send + Sync {
    /// Block until the lock is held.
    async fn acquire(&self) -> Result<SessionGuard, SessionError>;
}
