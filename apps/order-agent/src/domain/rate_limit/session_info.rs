//! Persisted throttle state shared by every process using one exchange account.

use serde::{Deserialize, Serialize};

use super::intensity::Intensity;

/// Strip everything from the first `?` onward.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    path.split_once('?').map_or(path, |(head, _)| head)
}

/// Throttle intensity recorded for one endpoint path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointCallRecord {
    /// Normalized endpoint path.
    pub path: String,
    /// Current intensity.
    pub intensity: Intensity,
}

impl EndpointCallRecord {
    /// Create a record, normalizing the path.
    #[must_use]
    pub fn new(path: &str, intensity: Intensity) -> Self {
        Self {
            path: normalize_path(path).to_string(),
            intensity,
        }
    }
}

/// Built-in endpoint table used when nothing has been persisted yet.
#[must_use]
pub fn default_calls() -> Vec<EndpointCallRecord> {
    vec![
        EndpointCallRecord::new("/orders", Intensity::Low),
        EndpointCallRecord::new("/orders/open", Intensity::Low),
        EndpointCallRecord::new("/orders/closed", Intensity::Low),
        EndpointCallRecord::new("/conditional-orders", Intensity::Low),
        EndpointCallRecord::new("/conditional-orders/open", Intensity::Low),
    ]
}

/// The `{cooldown, calls}` document persisted per exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Set by a rate-limit rejection, cleared by the next evaluation.
    #[serde(default)]
    pub cooldown: bool,
    /// Per-endpoint intensity records.
    #[serde(default)]
    pub calls: Vec<EndpointCallRecord>,
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self::with_calls(default_calls())
    }
}

impl SessionInfo {
    /// Document with the given table and no cooldown.
    #[must_use]
    pub const fn with_calls(calls: Vec<EndpointCallRecord>) -> Self {
        Self {
            cooldown: false,
            calls,
        }
    }

    /// Intensity for a call path. Unknown endpoints run at `Low`.
    #[must_use]
    pub fn intensity_for(&self, path: &str) -> Intensity {
        let path = normalize_path(path);
        self.calls
            .iter()
            .find(|call| call.path == path)
            .map_or(Intensity::Low, |call| call.intensity)
    }

    /// Clear the cooldown flag, returning whether it was set.
    pub fn take_cooldown(&mut self) -> bool {
        std::mem::take(&mut self.cooldown)
    }

    /// Apply a server-reported rate-limit rejection for `path`.
    ///
    /// A known endpoint is raised one level unless the rejection came right
    /// after a cooldown (`cooled`). An unknown endpoint is added at `Two`.
    /// The cooldown flag is always set.
    pub fn record_rate_limit(&mut self, path: &str, cooled: bool) {
        let path = normalize_path(path);
        let mut exists = false;
        for call in self.calls.iter_mut().filter(|call| call.path == path) {
            if !cooled {
                call.intensity = call.intensity.raise();
            }
            exists = true;
        }
        if !exists {
            self.calls.push(EndpointCallRecord::new(path, Intensity::Two));
        }
        self.cooldown = true;
    }
}
