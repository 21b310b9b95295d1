//! Ordered win/loss rules evaluated after every turn.
//!
//! Rules are declared in a fixed order and the first match ends the
//! session. Whether losses are checked before wins is a per-game design
//! choice expressed in the config, not an accident of code order.

use crate::ledger::{Comparator, ResourceLedger, UnknownResource};
use serde::{Deserialize, Serialize};

/// Whether a matched rule ends the session in victory or defeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Win,
    Loss,
}

/// One condition inside a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Compare a resource against a threshold.
    Resource {
        resource: String,
        cmp: Comparator,
        value: i64,
    },
    /// Compare the turn counter against a limit (max-turn safeguards).
    TurnCount { cmp: Comparator, value: u32 },
}

impl Trigger {
    fn holds(&self, ledger: &ResourceLedger, turn: u32) -> Result<bool, UnknownResource> {
        match self {
            Self::Resource {
                resource,
                cmp,
                value,
            } => ledger.meets(resource, *cmp, *value),
            Self::TurnCount { cmp, value } => Ok(cmp.holds(i64::from(turn), i64::from(*value))),
        }
    }
}

/// A named termination rule; all triggers must hold for the rule to match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationRule {
    pub id: String,
    pub kind: RuleKind,
    #[serde(default)]
    pub desc: String,
    pub when: Vec<Trigger>,
}

impl TerminationRule {
    /// Whether every trigger currently holds.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownResource`] for undeclared names; unreachable on a
    /// validated config.
    pub fn matches(&self, ledger: &ResourceLedger, turn: u32) -> Result<bool, UnknownResource> {
        for trigger in &self.when {
            if !trigger.holds(ledger, turn)? {
                return Ok(false);
            }
        }
        Ok(!self.when.is_empty())
    }
}

/// Evaluate rules in declared order; the first match wins.
///
/// # Errors
///
/// Returns [`UnknownResource`] for undeclared names; unreachable on a
/// validated config.
pub fn evaluate<'a>(
    rules: &'a [TerminationRule],
    ledger: &ResourceLedger,
    turn: u32,
) -> Result<Option<&'a TerminationRule>, UnknownResource> {
    for rule in rules {
        if rule.matches(ledger, turn)? {
            return Ok(Some(rule));
        }
    }
    Ok(None)
}
