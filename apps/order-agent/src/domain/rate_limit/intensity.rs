//! Throttle intensity tiers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Discrete throttle level for one endpoint.
///
/// Persisted as its ordinal so session files stay compact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Intensity {
    /// One request per second.
    #[default]
    Low,
    /// One request every two seconds.
    Two,
    /// One request every three seconds.
    Three,
    /// One request every five seconds.
    Super,
}

impl Intensity {
    /// Requests-per-second budget.
    #[must_use]
    pub fn requests_per_second(self) -> f64 {
        1.0 / self.min_interval().as_secs_f64()
    }

    /// Minimum spacing between two calls.
    #[must_use]
    pub const fn min_interval(self) -> Duration {
        match self {
            Self::Low => Duration::from_secs(1),
            Self::Two => Duration::from_secs(2),
            Self::Three => Duration::from_secs(3),
            Self::Super => Duration::from_secs(5),
        }
    }

    /// One level stricter, saturating at `Super`.
    #[must_use]
    pub const fn raise(self) -> Self {
        match self {
            Self::Low => Self::Two,
            Self::Two => Self::Three,
            Self::Three | Self::Super => Self::Super,
        }
    }
}

impl From<u8> for Intensity {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Low,
            1 => Self::Two,
            2 => Self::Three,
            _ => Self::Super,
        }
    }
}

impl From<Intensity> for u8 {
    fn from(value: Intensity) -> Self {
        match value {
            Intensity::Low => 0,
            Intensity::Two => 1,
            Intensity::Three => 2,
            Intensity::Super => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Intensity::Low, Intensity::Two)]
    #[test_case(Intensity::Two, Intensity::Three)]
    #[test_case(Intensity::Three, Intensity::Super)]
    #[test_case(Intensity::Super, Intensity::Super)]
    fn raise_is_one_step(from: Intensity, to: Intensity) {
        assert_eq!(from.raise(), to);
    }

    #[test]
    fn super_is_strictest() {
        assert!(Intensity::Super.requests_per_second() < Intensity::Three.requests_per_second());
        assert!((Intensity::Low.requests_per_second() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_as_ordinal() {
        assert_eq!(serde_json::to_string(&Intensity::Three).unwrap(), "2");
        let parsed: Intensity = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, Intensity::Two);
    }
}
