//! Notification verbosity.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::shared::DomainError;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Informational.
    Info,
    /// A failure.
    Error,
    /// An order appeared.
    Opened,
    /// An order filled.
    Filled,
    /// An order was cancelled.
    Cancelled,
}

/// Verbosity selected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    /// Nothing is sent.
    Off,
    /// Errors only.
    Errors,
    /// Everything except opened orders.
    #[default]
    Default,
    /// Everything.
    Verbose,
}

impl NotifyLevel {
    /// True if a message of `kind` may be sent at this level.
    #[must_use]
    pub const fn can_send(self, kind: MessageKind) -> bool {
        match self {
            Self::Off => false,
            Self::Errors => matches!(kind, MessageKind::Error),
            Self::Default => !matches!(kind, MessageKind::Opened),
            Self::Verbose => true,
        }
    }
}

impl FromStr for NotifyLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(Self::Off),
            "errors" | "1" => Ok(Self::Errors),
            "default" | "2" => Ok(Self::Default),
            "verbose" | "3" => Ok(Self::Verbose),
            other => Err(DomainError::InvalidValue {
                field: "notify".to_string(),
                message: format!("unknown level: {other}"),
            }),
        }
    }
}
