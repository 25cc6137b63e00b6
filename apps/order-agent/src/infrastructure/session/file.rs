//! File-backed session store and OS-level lock.
//!
//! Layout under the session directory, per exchange:
//!
//! - `<exchange>.time`: RFC 3339 completion time of the last request
//! - `<exchange>.json`: endpoint table and cooldown flag
//! - `<exchange>.lock`: advisory lock file

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::application::ports::{SessionError, SessionGuard, SessionLock, SessionStore};
use crate::domain::rate_limit::SessionInfo;

fn io_error(path: &Path, err: &impl std::fmt::Display) -> SessionError {
    SessionError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn session_file(dir: &Path, exchange: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{extension}", exchange.to_ascii_lowercase()))
}

/// Session files in a directory shared by all processes of one account.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    time_path: PathBuf,
    info_path: PathBuf,
}

impl FileSessionStore {
    /// Store for `exchange` under `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>, exchange: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            time_path: session_file(dir, exchange, "time"),
            info_path: session_file(dir, exchange, "json"),
        }
    }

    async fn read(path: &Path) -> Result<Option<String>, SessionError> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(path, &e)),
        }
    }

    /// Replace `path` through a sibling temp file so readers never see a
    /// partial write. Callers hold the session lock.
    async fn write(path: &Path, contents: String) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, &e))?;
        }
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        tokio::fs::write(&staging, contents)
            .await
            .map_err(|e| io_error(&staging, &e))?;
        tokio::fs::rename(&staging, path).await.map_err(|e| io_error(path, &e))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn last_request(&self) -> Result<Option<DateTime<Utc>>, SessionError> {
        let Some(contents) = Self::read(&self.time_path).await? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(contents.trim())
            .map(|at| Some(at.with_timezone(&Utc)))
            .map_err(|e| SessionError::Corrupt {
                path: self.time_path.display().to_string(),
                message: e.to_string(),
            })
    }

    async fn set_last_request(&self, at: DateTime<Utc>) -> Result<(), SessionError> {
        Self::write(&self.time_path, at.to_rfc3339_opts(SecondsFormat::Nanos, true)).await
    }

    async fn load_info(&self) -> Result<SessionInfo, SessionError> {
        let Some(contents) = Self::read(&self.info_path).await? else {
            debug!(path = %self.info_path.display(), "No session info yet, using defaults");
            return Ok(SessionInfo::default());
        };
        serde_json::from_str(&contents).map_err(|e| SessionError::Corrupt {
            path: self.info_path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn save_info(&self, info: &SessionInfo) -> Result<(), SessionError> {
        let contents = serde_json::to_string_pretty(info).map_err(|e| io_error(&self.info_path, &e))?;
        Self::write(&self.info_path, contents).await
    }
}

/// Exclusive advisory lock on `<exchange>.lock`.
#[derive(Debug, Clone)]
pub struct FileSessionLock {
    path: PathBuf,
}

impl FileSessionLock {
    /// Lock for `exchange` under `dir`.
    pub fn new(dir: impl AsRef<Path>, exchange: &str) -> Self {
        Self {
            path: session_file(dir.as_ref(), exchange, "lock"),
        }
    }
}

struct HeldLock(File);

impl Drop for HeldLock {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock as well.
        let _ = self.0.unlock();
    }
}

#[async_trait]
impl SessionLock for FileSessionLock {
    async fn acquire(&self) -> Result<SessionGuard, SessionError> {
        let path = self.path.clone();
        let lock_error = |message: String| SessionError::Lock { message };
        let held = tokio::task::spawn_blocking(move || -> Result<HeldLock, SessionError> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| io_error(parent, &e))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)
                .map_err(|e| io_error(&path, &e))?;
            file.lock().map_err(|e| SessionError::Lock {
                message: format!("{}: {e}", path.display()),
            })?;
            Ok(HeldLock(file))
        })
        .await
        .map_err(|e| lock_error(e.to_string()))??;
        Ok(SessionGuard::new(held))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Clock;
    use crate::application::services::RequestGovernor;
    use crate::domain::rate_limit::Intensity;
    use crate::infrastructure::clock::ManualClock;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn missing_files_mean_fresh_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path(), "Bittrex");
        assert_eq!(store.last_request().await.unwrap(), None);
        assert_eq!(store.load_info().await.unwrap(), SessionInfo::default());
    }

    #[tokio::test]
    async fn state_survives_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc::now();
        let store = FileSessionStore::new(dir.path().join("nested"), "Bittrex");
        store.set_last_request(at).await.unwrap();
        let mut info = SessionInfo::default();
        info.record_rate_limit("/markets", false);
        store.save_info(&info).await.unwrap();

        let reopened = FileSessionStore::new(dir.path().join("nested"), "bittrex");
        assert_eq!(reopened.last_request().await.unwrap(), Some(at));
        let loaded = reopened.load_info().await.unwrap();
        assert!(loaded.cooldown);
        assert_eq!(loaded.intensity_for("/markets"), Intensity::Two);
    }

    #[tokio::test]
    async fn corrupt_info_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bittrex.json"), "{not json").unwrap();
        let store = FileSessionStore::new(dir.path(), "bittrex");
        assert!(matches!(store.load_info().await, Err(SessionError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn writes_leave_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path(), "bittrex");
        store.set_last_request(Utc::now()).await.unwrap();
        store.save_info(&SessionInfo::default()).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["bittrex.json", "bittrex.time"]);
    }

    #[tokio::test]
    async fn empty_time_file_does_not_wedge_the_governor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bittrex.time"), "").unwrap();
        let store = Arc::new(FileSessionStore::new(dir.path(), "bittrex"));
        let clock = Arc::new(ManualClock::default());
        let governor = RequestGovernor::new(
            store.clone(),
            Arc::new(FileSessionLock::new(dir.path(), "bittrex")),
            clock.clone(),
        );

        for _ in 0..3 {
            let permit = governor.before("/orders").await.unwrap();
            governor.after(permit).await;
        }

        assert_eq!(store.last_request().await.unwrap(), Some(clock.now()));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1); 3]);
    }

    #[tokio::test]
    async fn lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let lock = FileSessionLock::new(dir.path(), "bittrex");
        let other = FileSessionLock::new(dir.path(), "bittrex");

        let guard = lock.acquire().await.unwrap();
        let blocked = tokio::time::timeout(Duration::from_millis(100), other.acquire()).await;
        assert!(blocked.is_err());

        drop(guard);
        let acquired = tokio::time::timeout(Duration::from_secs(5), other.acquire()).await;
        assert!(acquired.unwrap().is_ok());
    }
}
