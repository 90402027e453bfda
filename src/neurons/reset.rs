use std::fmt;
use std::str::FromStr;

use burn::constant;
use serde::{Deserialize, Serialize};

use crate::error::NeuronError;

/// Post-spike membrane adjustment.
///
/// Chosen once at construction; every step runs exactly one branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMechanism {
    /// Subtract the threshold from the membrane after a spike
    #[default]
    Subtract,
    /// Zero the freshly integrated state after a spike
    Zero,
    /// Pure integration, the membrane is never reset
    None,
}

impl ResetMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetMechanism::Subtract => "subtract",
            ResetMechanism::Zero => "zero",
            ResetMechanism::None => "none",
        }
    }
}

impl FromStr for ResetMechanism {
    type Err = NeuronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "subtract" => Ok(ResetMechanism::Subtract),
            "zero" => Ok(ResetMechanism::Zero),
            "none" => Ok(ResetMechanism::None),
            _ => Err(NeuronError::UnknownResetMechanism(s.to_string())),
        }
    }
}

burn::constant!(ResetMechanism);

impl fmt::Display for ResetMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reset_tokens() {
        assert_eq!("subtract".parse::<ResetMechanism>().unwrap(), ResetMechanism::Subtract);
        assert_eq!("ZERO".parse::<ResetMechanism>().unwrap(), ResetMechanism::Zero);
        assert_eq!("none".parse::<ResetMechanism>().unwrap(), ResetMechanism::None);
    }

    #[test]
    fn test_unknown_reset_token() {
        let err = "soft".parse::<ResetMechanism>().unwrap_err();
        assert!(matches!(err, NeuronError::UnknownResetMechanism(ref t) if t == "soft"));
        assert!(err.to_string().contains("soft"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for mechanism in [ResetMechanism::Subtract, ResetMechanism::Zero, ResetMechanism::None] {
            assert_eq!(mechanism.to_string().parse::<ResetMechanism>().unwrap(), mechanism);
        }
    }
}
