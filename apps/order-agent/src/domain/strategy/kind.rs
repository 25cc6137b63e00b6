//! Strategy selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::shared::DomainError;

/// How filled buys are followed up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Plain limit sell at the take-profit target.
    #[default]
    Standard,
    /// Limit sell protected by a conditional stop (OCO).
    StopLoss,
}

impl StrategyKind {
    /// Config name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::StopLoss => "stop_loss",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(Self::Standard),
            "stop_loss" => Ok(Self::StopLoss),
            other => Err(DomainError::InvalidValue {
                field: "strategy".to_string(),
                message: format!("strategy not implemented: {other}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("standard", StrategyKind::Standard)]
    #[test_case("STOP_LOSS", StrategyKind::StopLoss)]
    #[test_case("stop-loss", StrategyKind::StopLoss)]
    fn parses(input: &str, expected: StrategyKind) {
        assert_eq!(input.parse::<StrategyKind>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown() {
        assert!("trailing".parse::<StrategyKind>().is_err());
    }
}
