//! In-memory session store and lock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::application::ports::{SessionError, SessionGuard, SessionLock, SessionStore};
use crate::domain::rate_limit::SessionInfo;

#[derive(Debug, Default)]
struct State {
    last_request: Option<DateTime<Utc>>,
    info: SessionInfo,
    fail_reads: bool,
    fail_writes: bool,
}

/// Session store held in process memory.
///
/// Failure switches let tests exercise the governor's degraded paths.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    state: Mutex<State>,
}

impl InMemorySessionStore {
    /// Current session document.
    #[must_use]
    pub fn info(&self) -> SessionInfo {
        self.state.lock().info.clone()
    }

    /// Make `load_info` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Make every write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    fn write_guard(&self) -> Result<parking_lot::MutexGuard<'_, State>, SessionError> {
        let state = self.state.lock();
        if state.fail_writes {
            return Err(SessionError::Io {
                path: "memory".to_string(),
                message: "writes disabled".to_string(),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn last_request(&self) -> Result<Option<DateTime<Utc>>, SessionError> {
        Ok(self.state.lock().last_request)
    }

    async fn set_last_request(&self, at: DateTime<Utc>) -> Result<(), SessionError> {
        self.write_guard()?.last_request = Some(at);
        Ok(())
    }

    async fn load_info(&self) -> Result<SessionInfo, SessionError> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(SessionError::Corrupt {
                path: "memory".to_string(),
                message: "reads disabled".to_string(),
            });
        }
        Ok(state.info.clone())
    }

    async fn save_info(&self, info: &SessionInfo) -> Result<(), SessionError> {
        self.write_guard()?.info = info.clone();
        Ok(())
    }
}

/// Process-local lock.
#[derive(Debug, Default)]
pub struct InMemorySessionLock {
    inner: Arc<AsyncMutex<()>>,
}

#[async_trait]
impl SessionLock for InMemorySessionLock {
    async fn acquire(&self) -> Result<SessionGuard, SessionError> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        Ok(SessionGuard::new(guard))
    }
}
