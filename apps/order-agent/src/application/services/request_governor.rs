//! Request Governor
//!
//! Cross-process adaptive rate limiter. Every exchange call is admitted by
//! [`RequestGovernor::before`], which takes the session lock and sleeps until
//! the endpoint's budget allows the call, and completed by
//! [`RequestGovernor::after`], which records the call time. The lock is held
//! by the returned [`Permit`] and released when it is dropped, so early
//! returns and failed calls release it too.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::application::ports::{Clock, ExchangeError, SessionError, SessionGuard, SessionLock, SessionStore};
use crate::domain::rate_limit::{EndpointCallRecord, Intensity, SessionInfo, default_calls, normalize_path};
use crate::observability::{record_governor_sleep, record_rate_limit_rejection};

/// Governor errors.
#[derive(Debug, Clone, Error)]
pub enum GovernorError {
    /// The session lock could not be taken.
    #[error("Failed to acquire session lock: {0}")]
    Lock(#[source] SessionError),

    /// The updated session document could not be written.
    #[error("Failed to persist throttle state: {0}")]
    Persist(#[source] SessionError),
}

impl From<GovernorError> for ExchangeError {
    fn from(err: GovernorError) -> Self {
        Self::Governor {
            message: err.to_string(),
        }
    }
}

/// Admission to make one exchange call.
#[derive(Debug)]
pub struct Permit {
    path: String,
    cooled: bool,
    _guard: SessionGuard,
}

impl Permit {
    /// Normalized endpoint path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// True if this call ran under the one-shot cooldown budget.
    #[must_use]
    pub const fn cooled(&self) -> bool {
        self.cooled
    }
}

/// Cross-process adaptive rate limiter.
pub struct RequestGovernor {
    store: Arc<dyn SessionStore>,
    lock: Arc<dyn SessionLock>,
    clock: Arc<dyn Clock>,
    fallback: Vec<EndpointCallRecord>,
}

impl RequestGovernor {
    /// Create a governor using the built-in endpoint table as fallback.
    pub fn new(store: Arc<dyn SessionStore>, lock: Arc<dyn SessionLock>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            lock,
            clock,
            fallback: default_calls(),
        }
    }

    /// Replace the fallback endpoint table.
    #[must_use]
    pub fn with_fallback(mut self, calls: Vec<EndpointCallRecord>) -> Self {
        self.fallback = calls;
        self
    }

    fn fallback_info(&self) -> SessionInfo {
        SessionInfo::with_calls(self.fallback.clone())
    }

    /// Take the session lock and wait until `path` may be called.
    ///
    /// # Errors
    ///
    /// Fails if the lock cannot be acquired or a consumed cooldown flag
    /// cannot be written back. The lock is released before returning an
    /// error. An unreadable last-request time costs the endpoint's full
    /// interval and is overwritten by [`RequestGovernor::after`].
    pub async fn before(&self, path: &str) -> Result<Permit, GovernorError> {
        let guard = self.lock.acquire().await.map_err(GovernorError::Lock)?;
        let path = normalize_path(path).to_string();

        // Time since the last request, or `None` for a fresh session.
        let elapsed = match self.store.last_request().await {
            Ok(last) => last.map(|at| (self.clock.now() - at).to_std().unwrap_or_default()),
            Err(e) => {
                warn!(path = %path, error = %e, "Last request time unreadable, waiting a full interval");
                Some(Duration::ZERO)
            }
        };

        let mut cooled = false;
        if let Some(elapsed) = elapsed {
            let (intensity, was_cooling) = self.budget(&path).await?;
            cooled = was_cooling;
            let interval = intensity.min_interval();
            if elapsed < interval {
                let wait = interval - elapsed;
                debug!(path = %path, ?intensity, seconds = wait.as_secs_f64(), "Throttling request");
                record_governor_sleep(wait.as_secs_f64());
                self.clock.sleep(wait).await;
            }
        }

        debug!(path = %path, cooled, "Request admitted");
        Ok(Permit {
            path,
            cooled,
            _guard: guard,
        })
    }

    /// Budget for `path`, consuming a pending cooldown.
    ///
    /// The flag stays set until its clearing is persisted, so a failed write
    /// leaves the cooldown for the next admitted call.
    async fn budget(&self, path: &str) -> Result<(Intensity, bool), GovernorError> {
        match self.store.load_info().await {
            Ok(mut info) => {
                if info.take_cooldown() {
                    self.store.save_info(&info).await.map_err(GovernorError::Persist)?;
                    return Ok((Intensity::Super, true));
                }
                Ok((info.intensity_for(path), false))
            }
            Err(e) => {
                debug!(error = %e, "Session info unreadable, using default endpoint table");
                Ok((self.fallback_info().intensity_for(path), false))
            }
        }
    }

    /// Record the call's completion time and release the lock.
    pub async fn after(&self, permit: Permit) {
        if let Err(e) = self.store.set_last_request(self.clock.now()).await {
            warn!(path = %permit.path, error = %e, "Failed to record request time");
        }
        drop(permit);
    }

    /// Feed a server-reported rate-limit rejection back into the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated session document cannot be written.
    pub async fn on_rate_limited(&self, permit: &Permit) -> Result<(), GovernorError> {
        let mut info = self.store.load_info().await.unwrap_or_else(|_| self.fallback_info());
        info.record_rate_limit(&permit.path, permit.cooled);
        record_rate_limit_rejection(&permit.path);
        warn!(
            path = %permit.path,
            cooled = permit.cooled,
            intensity = ?info.intensity_for(&permit.path),
            "Rate limited by exchange"
        );
        self.store.save_info(&info).await.map_err(GovernorError::Persist)
    }

    /// Run one exchange call under the governor.
    ///
    /// # Errors
    ///
    /// Returns the call's own error, or a governor error if admission failed
    /// or a rate-limit rejection could not be persisted.
    pub async fn execute<T, F, Fut>(&self, path: &str, call: F) -> Result<T, ExchangeError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, ExchangeError>> + Send,
        T: Send,
    {
        let permit = self.before(path).await?;
        let result = call().await;
        if matches!(&result, Err(e) if e.is_rate_limited()) {
            if let Err(e) = self.on_rate_limited(&permit).await {
                self.after(permit).await;
                return Err(e.into());
            }
        }
        self.after(permit).await;
        result
    }
}
