//! Player-invocable actions and their registry.

use crate::effects::{self, EffectOp};
use crate::facts::{Fact, FactList};
use crate::ledger::{Comparator, ResourceLedger, UnknownResource};
use crate::rng::TurnRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A predicate over the ledger gating an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub resource: String,
    pub cmp: Comparator,
    pub value: i64,
}

/// Declaration of one player-invocable action. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub desc: String,
    /// All requirements must hold for the action to be available.
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// Resource amounts deducted before the effect program runs. An action
    /// is unaffordable when paying would push a resource below its floor.
    #[serde(default)]
    pub cost: BTreeMap<String, i64>,
    #[serde(default)]
    pub effects: Vec<EffectOp>,
    /// Event table rolled after this action resolves. Falls back to the
    /// config's default table when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<String>,
}

impl ActionDef {
    /// Display label, falling back to the id.
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// Structured reason an action request was turned down. Reported to the
/// caller; the turn is not consumed and the ledger is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    RequirementFailed {
        resource: String,
        cmp: Comparator,
        threshold: i64,
        actual: i64,
    },
    InsufficientResource {
        resource: String,
        needed: i64,
        available: i64,
    },
}

/// Result of invoking a registered action against a ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Costs deducted and effects applied; narration facts collected.
    Accepted { facts: FactList },
    /// Preconditions or affordability failed; ledger unchanged.
    Rejected { reason: RejectReason },
}

/// Read-only registry of the actions one game declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionRegistry {
    actions: Vec<ActionDef>,
}

impl ActionRegistry {
    #[must_use]
    pub const fn new(actions: Vec<ActionDef>) -> Self {
        Self { actions }
    }

    /// Look up an action by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|action| action.id == id)
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, ActionDef> {
        self.actions.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check requirements and affordability without touching the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownResource`] for undeclared names; unreachable on a
    /// validated config.
    pub fn check(
        &self,
        action: &ActionDef,
        ledger: &ResourceLedger,
    ) -> Result<Option<RejectReason>, UnknownResource> {
        for requirement in &action.requires {
            let actual = ledger.get(&requirement.resource)?;
            if !requirement.cmp.holds(actual, requirement.value) {
                return Ok(Some(RejectReason::RequirementFailed {
                    resource: requirement.resource.clone(),
                    cmp: requirement.cmp,
                    threshold: requirement.value,
                    actual,
                }));
            }
        }
        for (resource, amount) in &action.cost {
            let available = ledger.get(resource)?;
            let floor = ledger.floor(resource)?.unwrap_or(i64::MIN);
            if available.saturating_sub(*amount) < floor {
                return Ok(Some(RejectReason::InsufficientResource {
                    resource: resource.clone(),
                    needed: *amount,
                    available,
                }));
            }
        }
        Ok(None)
    }

    /// Invoke an action: evaluate preconditions, deduct costs, run the
    /// effect program. Rejection leaves the ledger untouched.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownResource`] for undeclared names; unreachable on a
    /// validated config.
    pub fn invoke<R: TurnRng>(
        &self,
        action: &ActionDef,
        ledger: &mut ResourceLedger,
        rng: &mut R,
    ) -> Result<ActionOutcome, UnknownResource> {
        if let Some(reason) = self.check(action, ledger)? {
            return Ok(ActionOutcome::Rejected { reason });
        }

        let mut facts = FactList::new();
        facts.push(Fact::ActionResolved {
            action: action.id.clone(),
        });
        for (resource, amount) in &action.cost {
            let applied = ledger.apply(resource, -amount)?;
            facts.push(Fact::ResourceChanged {
                resource: resource.clone(),
                delta: -amount,
                value: applied.value,
            });
        }
        effects::run_program(&action.effects, ledger, rng, &mut facts)?;
        Ok(ActionOutcome::Accepted { facts })
    }
}

impl<'a> IntoIterator for &'a ActionRegistry {
    type Item = &'a ActionDef;
    type IntoIter = std::slice::Iter<'a, ActionDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ResourceDef;
    use crate::rng::StreamBundle;

    fn ledger() -> ResourceLedger {
        ResourceLedger::from_defs(&[
            ResourceDef {
                name: "fuel".into(),
                initial: 10,
                min: Some(0),
                max: Some(10),
            },
            ResourceDef {
                name: "credits".into(),
                initial: 0,
                min: Some(0),
                max: None,
            },
        ])
    }

    fn move_action() -> ActionDef {
        ActionDef {
            id: "move".into(),
            label: "Travel".into(),
            desc: String::new(),
            requires: Vec::new(),
            cost: BTreeMap::from([("fuel".to_string(), 5)]),
            effects: Vec::new(),
            events: None,
        }
    }

    #[test]
    fn costs_deduct_on_acceptance() {
        let registry = ActionRegistry::new(vec![move_action()]);
        let mut ledger = ledger();
        let mut bundle = StreamBundle::from_user_seed(1);
        let action = registry.get("move").unwrap();

        let outcome = registry
            .invoke(action, &mut ledger, bundle.effects())
            .unwrap();
        assert!(matches!(outcome, ActionOutcome::Accepted { .. }));
        assert_eq!(ledger.get("fuel").unwrap(), 5);
    }

    #[test]
    fn third_move_rejects_with_insufficient_fuel() {
        // fuel 10, cost 5: two acceptances, then rejection at fuel 0.
        let registry = ActionRegistry::new(vec![move_action()]);
        let mut ledger = ledger();
        let mut bundle = StreamBundle::from_user_seed(1);
        let action = registry.get("move").unwrap();

        for expected in [5, 0] {
            let outcome = registry
                .invoke(action, &mut ledger, bundle.effects())
                .unwrap();
            assert!(matches!(outcome, ActionOutcome::Accepted { .. }));
            assert_eq!(ledger.get("fuel").unwrap(), expected);
        }

        let outcome = registry
            .invoke(action, &mut ledger, bundle.effects())
            .unwrap();
        match outcome {
            ActionOutcome::Rejected {
                reason:
                    RejectReason::InsufficientResource {
                        resource,
                        needed,
                        available,
                    },
            } => {
                assert_eq!(resource, "fuel");
                assert_eq!(needed, 5);
                assert_eq!(available, 0);
            }
            other => panic!("expected insufficient-resource rejection, got {other:?}"),
        }
        assert_eq!(ledger.get("fuel").unwrap(), 0);
    }

    #[test]
    fn requirement_failure_reports_actual_value() {
        let action = ActionDef {
            id: "sell".into(),
            label: String::new(),
            desc: String::new(),
            requires: vec![Requirement {
                resource: "credits".into(),
                cmp: Comparator::Ge,
                value: 100,
            }],
            cost: BTreeMap::new(),
            effects: Vec::new(),
            events: None,
        };
        let registry = ActionRegistry::new(vec![action]);
        let mut ledger = ledger();
        let mut bundle = StreamBundle::from_user_seed(1);
        let action = registry.get("sell").unwrap();

        let outcome = registry
            .invoke(action, &mut ledger, bundle.effects())
            .unwrap();
        match outcome {
            ActionOutcome::Rejected {
                reason: RejectReason::RequirementFailed { actual, .. },
            } => assert_eq!(actual, 0),
            other => panic!("expected requirement rejection, got {other:?}"),
        }
    }

    #[test]
    fn rejection_leaves_ledger_untouched() {
        let mut action = move_action();
        action.cost.insert("credits".into(), 50);
        let registry = ActionRegistry::new(vec![action]);
        let mut ledger = ledger();
        let mut bundle = StreamBundle::from_user_seed(1);
        let action = registry.get("move").unwrap();

        let outcome = registry
            .invoke(action, &mut ledger, bundle.effects())
            .unwrap();
        assert!(matches!(outcome, ActionOutcome::Rejected { .. }));
        assert_eq!(ledger.get("fuel").unwrap(), 10);
        assert_eq!(ledger.get("credits").unwrap(), 0);
    }

    #[test]
    fn cost_against_unbounded_floor_is_always_affordable() {
        let ledger_defs = [ResourceDef {
            name: "karma".into(),
            initial: 0,
            min: None,
            max: None,
        }];
        let mut ledger = ResourceLedger::from_defs(&ledger_defs);
        let action = ActionDef {
            id: "gamble".into(),
            label: String::new(),
            desc: String::new(),
            requires: Vec::new(),
            cost: BTreeMap::from([("karma".to_string(), 10)]),
            effects: Vec::new(),
            events: None,
        };
        let registry = ActionRegistry::new(vec![action]);
        let mut bundle = StreamBundle::from_user_seed(1);
        let action = registry.get("gamble").unwrap();

        let outcome = registry
            .invoke(action, &mut ledger, bundle.effects())
            .unwrap();
        assert!(matches!(outcome, ActionOutcome::Accepted { .. }));
        assert_eq!(ledger.get("karma").unwrap(), -10);
    }

    #[test]
    fn display_label_falls_back_to_id() {
        let mut action = move_action();
        assert_eq!(action.display_label(), "Travel");
        action.label.clear();
        assert_eq!(action.display_label(), "move");
    }
}
