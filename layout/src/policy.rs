//! Whether manually placed positions survive a re-layout.

#[cfg(test)]
#[path = "policy_test.rs"]
mod policy_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Entity, PositionMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionPolicy {
    /// Entities with a stored position keep it; only unplaced ones move.
    #[default]
    Preserve,
    /// Every entity takes the freshly computed position.
    Reset,
}

impl PositionPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for PositionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown position policy: {0}")]
pub struct ParsePolicyError(pub String);

impl FromStr for PositionPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preserve" | "keep" => Ok(Self::Preserve),
            "reset" => Ok(Self::Reset),
            _ => Err(ParsePolicyError(s.to_owned())),
        }
    }
}

/// Merge stored positions with a computed layout under `policy`.
///
/// Entities missing from `computed` keep their stored position (if any)
/// regardless of policy.
#[must_use]
pub fn apply_policy(policy: PositionPolicy, entities: &[Entity], computed: &PositionMap) -> PositionMap {
    let mut resolved = PositionMap::new();
    for entity in entities {
        let chosen = match (policy, entity.position, computed.get(&entity.id)) {
            (PositionPolicy::Preserve, Some(stored), _) => Some(stored),
            (_, _, Some(fresh)) => Some(*fresh),
            (_, stored, None) => stored,
        };
        if let Some(point) = chosen {
            resolved.insert(entity.id, point);
        }
    }
    resolved
}
