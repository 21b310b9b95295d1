//! Structured narration facts emitted by turn resolution.
//!
//! Facts are data for the presentation layer. The engine never formats
//! game text; a fact carries the resource, delta, or rule involved and the
//! caller decides how to render it.

use crate::ledger::ClampEdge;
use crate::session::SessionStatus;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Maximum facts stored inline without additional allocations.
pub type FactList = SmallVec<[Fact; 8]>;

/// Severity tier for a narration fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactSeverity {
    Info,
    Warning,
    Critical,
}

/// One narration fact produced while resolving a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fact {
    /// An action was accepted and its costs and effects applied.
    ActionResolved { action: String },
    /// A resource moved; `delta` is the requested change, `value` the
    /// post-clamp result.
    ResourceChanged {
        resource: String,
        delta: i64,
        value: i64,
    },
    /// A mutation hit a declared bound ("fuel depleted", "cargo full").
    ResourceClamped {
        resource: String,
        edge: ClampEdge,
        value: i64,
    },
    /// A random event was selected from a table.
    EventStruck { event: String, table: String },
    /// Free-form narration declared in config.
    Note { text: String },
    /// A termination rule matched and the session left `Running`.
    SessionEnded { status: SessionStatus, rule: String },
}

impl Fact {
    /// Severity tier used by presentation layers to prioritize rendering.
    #[must_use]
    pub const fn severity(&self) -> FactSeverity {
        match self {
            Self::ActionResolved { .. }
            | Self::ResourceChanged { .. }
            | Self::EventStruck { .. }
            | Self::Note { .. } => FactSeverity::Info,
            Self::ResourceClamped { .. } => FactSeverity::Warning,
            Self::SessionEnded { .. } => FactSeverity::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facts_roundtrip_through_json() {
        let facts: Vec<Fact> = vec![
            Fact::ActionResolved {
                action: "travel".into(),
            },
            Fact::ResourceClamped {
                resource: "fuel".into(),
                edge: ClampEdge::Floor,
                value: 0,
            },
            Fact::SessionEnded {
                status: SessionStatus::Lost,
                rule: "out-of-fuel".into(),
            },
        ];
        let json = serde_json::to_string(&facts).expect("serialize");
        let restored: Vec<Fact> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, facts);
    }

    #[test]
    fn severity_tiers_follow_kind() {
        let info = Fact::Note {
            text: "quiet day".into(),
        };
        let warn = Fact::ResourceClamped {
            resource: "fuel".into(),
            edge: ClampEdge::Floor,
            value: 0,
        };
        let critical = Fact::SessionEnded {
            status: SessionStatus::Won,
            rule: "rich".into(),
        };
        assert_eq!(info.severity(), FactSeverity::Info);
        assert_eq!(warn.severity(), FactSeverity::Warning);
        assert_eq!(critical.severity(), FactSeverity::Critical);
    }
}
