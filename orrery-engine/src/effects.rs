//! Data-driven effect programs.
//!
//! Effects are pure data interpreted against `(ledger, rng)`, never
//! closures over outer state. Interpretation order is declaration order and
//! all randomness flows through the session's effect stream, so a seed plus
//! a config fully determines every outcome.

use crate::facts::{Fact, FactList};
use crate::ledger::{ResourceLedger, UnknownResource};
use crate::rng::TurnRng;
use serde::{Deserialize, Serialize};

/// One step of an effect program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EffectOp {
    /// Add a fixed delta to a resource.
    Add { resource: String, amount: i64 },
    /// Add a uniform integer drawn from the inclusive range `[min, max]`.
    AddRange {
        resource: String,
        min: i64,
        max: i64,
    },
    /// Overwrite a resource.
    Set { resource: String, value: i64 },
    /// Run `then` with probability `p`, otherwise `or_else`.
    Chance {
        p: f32,
        #[serde(default)]
        then: Vec<EffectOp>,
        #[serde(default)]
        or_else: Vec<EffectOp>,
    },
    /// Emit a free-form narration fact.
    Note { text: String },
}

fn apply_delta(
    ledger: &mut ResourceLedger,
    resource: &str,
    delta: i64,
    facts: &mut FactList,
) -> Result<(), UnknownResource> {
    let applied = ledger.apply(resource, delta)?;
    facts.push(Fact::ResourceChanged {
        resource: resource.to_string(),
        delta,
        value: applied.value,
    });
    if let Some(edge) = applied.clamped {
        facts.push(Fact::ResourceClamped {
            resource: resource.to_string(),
            edge,
            value: applied.value,
        });
    }
    Ok(())
}

/// Interpret an effect program against the ledger, appending narration
/// facts for every mutation.
///
/// # Errors
///
/// Returns [`UnknownResource`] for undeclared resource names. Configuration
/// validation checks every program at load time, so a validated config
/// cannot hit this during play.
pub fn run_program<R: TurnRng>(
    program: &[EffectOp],
    ledger: &mut ResourceLedger,
    rng: &mut R,
    facts: &mut FactList,
) -> Result<(), UnknownResource> {
    for op in program {
        match op {
            EffectOp::Add { resource, amount } => {
                apply_delta(ledger, resource, *amount, facts)?;
            }
            EffectOp::AddRange { resource, min, max } => {
                let delta = rng.int_in(*min, *max);
                apply_delta(ledger, resource, delta, facts)?;
            }
            EffectOp::Set { resource, value } => {
                let before = ledger.get(resource)?;
                let applied = ledger.set(resource, *value)?;
                facts.push(Fact::ResourceChanged {
                    resource: resource.clone(),
                    delta: applied.value - before,
                    value: applied.value,
                });
                if let Some(edge) = applied.clamped {
                    facts.push(Fact::ResourceClamped {
                        resource: resource.clone(),
                        edge,
                        value: applied.value,
                    });
                }
            }
            EffectOp::Chance { p, then, or_else } => {
                let branch = if rng.chance(*p) { then } else { or_else };
                run_program(branch, ledger, rng, facts)?;
            }
            EffectOp::Note { text } => {
                facts.push(Fact::Note { text: text.clone() });
            }
        }
    }
    Ok(())
}

/// Walk a program tree, visiting every op including nested branches.
pub fn visit_ops<'a>(program: &'a [EffectOp], visit: &mut impl FnMut(&'a EffectOp)) {
    for op in program {
        visit(op);
        if let EffectOp::Chance { then, or_else, .. } = op {
            visit_ops(then, visit);
            visit_ops(or_else, visit);
        }
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
                initial: 50,
                min: Some(0),
                max: Some(100),
            },
            ResourceDef {
                name: "credits".into(),
                initial: 0,
                min: Some(0),
                max: None,
            },
        ])
    }

    #[test]
    fn add_emits_change_fact() {
        let mut ledger = ledger();
        let mut bundle = StreamBundle::from_user_seed(1);
        let mut facts = FactList::new();
        let program = vec![EffectOp::Add {
            resource: "fuel".into(),
            amount: -10,
        }];
        run_program(&program, &mut ledger, bundle.effects(), &mut facts).unwrap();
        assert_eq!(ledger.get("fuel").unwrap(), 40);
        assert_eq!(
            facts.as_slice(),
            [Fact::ResourceChanged {
                resource: "fuel".into(),
                delta: -10,
                value: 40,
            }]
        );
    }

    #[test]
    fn clamped_mutation_emits_both_facts() {
        let mut ledger = ledger();
        let mut bundle = StreamBundle::from_user_seed(1);
        let mut facts = FactList::new();
        let program = vec![EffectOp::Add {
            resource: "fuel".into(),
            amount: -500,
        }];
        run_program(&program, &mut ledger, bundle.effects(), &mut facts).unwrap();
        assert_eq!(ledger.get("fuel").unwrap(), 0);
        assert_eq!(facts.len(), 2);
        assert!(matches!(facts[1], Fact::ResourceClamped { .. }));
    }

    #[test]
    fn add_range_draws_within_bounds() {
        let mut ledger = ledger();
        let mut bundle = StreamBundle::from_user_seed(77);
        let mut facts = FactList::new();
        let program = vec![EffectOp::AddRange {
            resource: "credits".into(),
            min: 50,
            max: 200,
        }];
        run_program(&program, &mut ledger, bundle.effects(), &mut facts).unwrap();
        let value = ledger.get("credits").unwrap();
        assert!((50..=200).contains(&value));
    }

    #[test]
    fn chance_is_deterministic_per_seed() {
        let run_with_seed = |seed: u64| {
            let mut ledger = ledger();
            let mut bundle = StreamBundle::from_user_seed(seed);
            let mut facts = FactList::new();
            let program = vec![EffectOp::Chance {
                p: 0.5,
                then: vec![EffectOp::Add {
                    resource: "credits".into(),
                    amount: 1,
                }],
                or_else: vec![EffectOp::Add {
                    resource: "credits".into(),
                    amount: 100,
                }],
            }];
            run_program(&program, &mut ledger, bundle.effects(), &mut facts).unwrap();
            ledger.get("credits").unwrap()
        };
        assert_eq!(run_with_seed(3), run_with_seed(3));
        assert_eq!(run_with_seed(1234), run_with_seed(1234));
    }

    #[test]
    fn chance_extremes_take_expected_branch() {
        let mut ledger = ledger();
        let mut bundle = StreamBundle::from_user_seed(9);
        let mut facts = FactList::new();
        let program = vec![
            EffectOp::Chance {
                p: 0.0,
                then: vec![EffectOp::Add {
                    resource: "credits".into(),
                    amount: 1,
                }],
                or_else: vec![],
            },
            EffectOp::Chance {
                p: 1.0,
                then: vec![EffectOp::Add {
                    resource: "credits".into(),
                    amount: 10,
                }],
                or_else: vec![],
            },
        ];
        run_program(&program, &mut ledger, bundle.effects(), &mut facts).unwrap();
        assert_eq!(ledger.get("credits").unwrap(), 10);
    }

    #[test]
    fn set_reports_delta_from_previous_value() {
        let mut ledger = ledger();
        let mut bundle = StreamBundle::from_user_seed(1);
        let mut facts = FactList::new();
        let program = vec![EffectOp::Set {
            resource: "fuel".into(),
            value: 80,
        }];
        run_program(&program, &mut ledger, bundle.effects(), &mut facts).unwrap();
        assert_eq!(
            facts.as_slice(),
            [Fact::ResourceChanged {
                resource: "fuel".into(),
                delta: 30,
                value: 80,
            }]
        );
    }

    #[test]
    fn unknown_resource_propagates() {
        let mut ledger = ledger();
        let mut bundle = StreamBundle::from_user_seed(1);
        let mut facts = FactList::new();
        let program = vec![EffectOp::Add {
            resource: "antimatter".into(),
            amount: 1,
        }];
        assert!(run_program(&program, &mut ledger, bundle.effects(), &mut facts).is_err());
    }

    #[test]
    fn visit_ops_reaches_nested_branches() {
        let program = vec![EffectOp::Chance {
            p: 0.3,
            then: vec![EffectOp::Note {
                text: "lucky".into(),
            }],
            or_else: vec![EffectOp::Chance {
                p: 0.5,
                then: vec![EffectOp::Note {
                    text: "nested".into(),
                }],
                or_else: vec![],
            }],
        }];
        let mut seen = 0;
        visit_ops(&program, &mut |_| seen += 1);
        assert_eq!(seen, 4);
    }
}
