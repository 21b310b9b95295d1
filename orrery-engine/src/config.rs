//! Game configuration schema and load-time validation.
//!
//! A [`GameConfig`] is pure data: the resource declarations, action
//! registry, event tables, and termination rules for one game. Everything
//! is cross-checked when the config is loaded; after validation no
//! configuration error can surface mid-session.

use crate::actions::{ActionDef, ActionRegistry};
use crate::effects::{self, EffectOp};
use crate::events::EventTableSet;
use crate::ledger::ResourceDef;
use crate::rules::{TerminationRule, Trigger};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Descriptive metadata shown by presentation layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

/// Complete declaration of one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub meta: GameMeta,
    pub resources: Vec<ResourceDef>,
    #[serde(default)]
    pub actions: ActionRegistry,
    #[serde(default)]
    pub event_tables: EventTableSet,
    /// Table rolled after actions that do not name their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_events: Option<String>,
    #[serde(default)]
    pub rules: Vec<TerminationRule>,
}

/// Malformed game definitions, rejected before any session exists.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate resource `{0}`")]
    DuplicateResource(String),
    #[error("resource `{0}` declares min greater than max")]
    InvalidBounds(String),
    #[error("resource `{resource}` initial value {initial} lies outside its bounds")]
    InitialOutOfBounds { resource: String, initial: i64 },
    #[error("duplicate action `{0}`")]
    DuplicateAction(String),
    #[error("{context} references unknown resource `{resource}`")]
    UnknownResource { context: String, resource: String },
    #[error("action `{action}` declares a negative cost for `{resource}`")]
    NegativeCost { action: String, resource: String },
    #[error("action `{action}` references unknown event table `{table}`")]
    UnknownTable { action: String, table: String },
    #[error("default event table `{0}` is not declared")]
    UnknownDefaultTable(String),
    #[error("duplicate event table `{0}`")]
    DuplicateTable(String),
    #[error("duplicate event `{event}` in table `{table}`")]
    DuplicateEvent { table: String, event: String },
    #[error("event `{event}` in table `{table}` has a negative weight")]
    NegativeWeight { table: String, event: String },
    #[error("event table `{0}` has a non-positive total weight")]
    NonPositiveTotalWeight(String),
    #[error("{context} declares chance probability {p} outside [0, 1]")]
    InvalidProbability { context: String, p: f32 },
    #[error("{context} declares a reversed range [{min}, {max}]")]
    InvalidRange { context: String, min: i64, max: i64 },
    #[error("duplicate rule `{0}`")]
    DuplicateRule(String),
    #[error("rule `{0}` has no triggers")]
    EmptyRule(String),
}

impl GameConfig {
    /// Parse and validate a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed JSON or any cross-reference
    /// violation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-check every id reference, weight, probability, and bound.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered, in declaration order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut resource_names = HashSet::new();
        for resource in &self.resources {
            if !resource_names.insert(resource.name.as_str()) {
                return Err(ConfigError::DuplicateResource(resource.name.clone()));
            }
            if let (Some(min), Some(max)) = (resource.min, resource.max)
                && min > max
            {
                return Err(ConfigError::InvalidBounds(resource.name.clone()));
            }
            let below = resource.min.is_some_and(|min| resource.initial < min);
            let above = resource.max.is_some_and(|max| resource.initial > max);
            if below || above {
                return Err(ConfigError::InitialOutOfBounds {
                    resource: resource.name.clone(),
                    initial: resource.initial,
                });
            }
        }

        let mut table_ids = HashSet::new();
        for table in &self.event_tables {
            if !table_ids.insert(table.id.as_str()) {
                return Err(ConfigError::DuplicateTable(table.id.clone()));
            }
            let mut event_ids = HashSet::new();
            for event in &table.events {
                if !event_ids.insert(event.id.as_str()) {
                    return Err(ConfigError::DuplicateEvent {
                        table: table.id.clone(),
                        event: event.id.clone(),
                    });
                }
                if event.weight < 0.0 {
                    return Err(ConfigError::NegativeWeight {
                        table: table.id.clone(),
                        event: event.id.clone(),
                    });
                }
                let context = format!("event `{}` in table `{}`", event.id, table.id);
                check_program(&context, &event.effects, &resource_names)?;
            }
            if !table.is_empty() && table.total_weight() <= 0.0 {
                return Err(ConfigError::NonPositiveTotalWeight(table.id.clone()));
            }
        }

        let mut action_ids = HashSet::new();
        for action in &self.actions {
            if !action_ids.insert(action.id.as_str()) {
                return Err(ConfigError::DuplicateAction(action.id.clone()));
            }
            let context = format!("action `{}`", action.id);
            for requirement in &action.requires {
                check_resource(&context, &requirement.resource, &resource_names)?;
            }
            for (resource, amount) in &action.cost {
                check_resource(&context, resource, &resource_names)?;
                if *amount < 0 {
                    return Err(ConfigError::NegativeCost {
                        action: action.id.clone(),
                        resource: resource.clone(),
                    });
                }
            }
            check_program(&context, &action.effects, &resource_names)?;
            if let Some(table) = &action.events
                && self.event_tables.get(table).is_none()
            {
                return Err(ConfigError::UnknownTable {
                    action: action.id.clone(),
                    table: table.clone(),
                });
            }
        }

        if let Some(table) = &self.default_events
            && self.event_tables.get(table).is_none()
        {
            return Err(ConfigError::UnknownDefaultTable(table.clone()));
        }

        let mut rule_ids = HashSet::new();
        for rule in &self.rules {
            if !rule_ids.insert(rule.id.as_str()) {
                return Err(ConfigError::DuplicateRule(rule.id.clone()));
            }
            if rule.when.is_empty() {
                return Err(ConfigError::EmptyRule(rule.id.clone()));
            }
            let context = format!("rule `{}`", rule.id);
            for trigger in &rule.when {
                if let Trigger::Resource { resource, .. } = trigger {
                    check_resource(&context, resource, &resource_names)?;
                }
            }
        }

        Ok(())
    }

    /// Event table resolved for an action: its own, else the default.
    #[must_use]
    pub fn table_for(&self, action: &ActionDef) -> Option<&crate::events::EventTable> {
        let id = action.events.as_ref().or(self.default_events.as_ref())?;
        self.event_tables.get(id)
    }
}

fn check_resource(
    context: &str,
    resource: &str,
    known: &HashSet<&str>,
) -> Result<(), ConfigError> {
    if known.contains(resource) {
        Ok(())
    } else {
        Err(ConfigError::UnknownResource {
            context: context.to_string(),
            resource: resource.to_string(),
        })
    }
}

fn check_program(
    context: &str,
    program: &[EffectOp],
    known: &HashSet<&str>,
) -> Result<(), ConfigError> {
    let mut first_error = None;
    effects::visit_ops(program, &mut |op| {
        if first_error.is_some() {
            return;
        }
        first_error = match op {
            EffectOp::Add { resource, .. } | EffectOp::Set { resource, .. } => {
                check_resource(context, resource, known).err()
            }
            EffectOp::AddRange { resource, min, max } => {
                if min > max {
                    Some(ConfigError::InvalidRange {
                        context: context.to_string(),
                        min: *min,
                        max: *max,
                    })
                } else {
                    check_resource(context, resource, known).err()
                }
            }
            EffectOp::Chance { p, .. } => {
                if (0.0..=1.0).contains(p) {
                    None
                } else {
                    Some(ConfigError::InvalidProbability {
                        context: context.to_string(),
                        p: *p,
                    })
                }
            }
            EffectOp::Note { .. } => None,
        };
    });
    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "meta": { "name": "Test Game" },
            "resources": [
                { "name": "fuel", "initial": 10, "min": 0, "max": 10 },
                { "name": "credits", "initial": 0, "min": 0 }
            ],
            "actions": [
                {
                    "id": "move",
                    "label": "Travel",
                    "cost": { "fuel": 5 },
                    "effects": [
                        { "op": "add_range", "resource": "credits", "min": 1, "max": 10 }
                    ],
                    "events": "space"
                }
            ],
            "event_tables": [
                {
                    "id": "space",
                    "events": [
                        { "id": "drift", "weight": 3.0 },
                        {
                            "id": "meteor",
                            "weight": 1.0,
                            "effects": [ { "op": "add", "resource": "fuel", "amount": -2 } ]
                        }
                    ]
                }
            ],
            "rules": [
                {
                    "id": "out-of-fuel",
                    "kind": "loss",
                    "when": [ { "kind": "resource", "resource": "fuel", "cmp": "le", "value": 0 } ]
                },
                {
                    "id": "rich",
                    "kind": "win",
                    "when": [ { "kind": "resource", "resource": "credits", "cmp": "ge", "value": 100 } ]
                }
            ]
        }"#
    }

    #[test]
    fn minimal_config_parses_and_validates() {
        let config = GameConfig::from_json(minimal_json()).unwrap();
        assert_eq!(config.meta.name, "Test Game");
        assert_eq!(config.resources.len(), 2);
        assert!(config.actions.get("move").is_some());
        assert!(config.event_tables.get("space").is_some());
        assert_eq!(config.rules.len(), 2);
    }

    #[test]
    fn table_for_prefers_action_table_over_default() {
        let mut config = GameConfig::from_json(minimal_json()).unwrap();
        config.default_events = Some("space".into());
        let action = config.actions.get("move").unwrap();
        assert_eq!(config.table_for(action).unwrap().id, "space");

        let mut bare = action.clone();
        bare.events = None;
        assert_eq!(config.table_for(&bare).unwrap().id, "space");
    }

    #[test]
    fn duplicate_resource_rejected() {
        let json = r#"{ "resources": [ { "name": "x" }, { "name": "x" } ] }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::DuplicateResource(name)) if name == "x"
        ));
    }

    #[test]
    fn reversed_bounds_rejected() {
        let json = r#"{ "resources": [ { "name": "x", "min": 5, "max": 1 } ] }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::InvalidBounds(_))
        ));
    }

    #[test]
    fn initial_outside_bounds_rejected() {
        let json = r#"{ "resources": [ { "name": "x", "initial": 50, "min": 0, "max": 10 } ] }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::InitialOutOfBounds { initial: 50, .. })
        ));
    }

    #[test]
    fn unknown_resource_in_effect_rejected() {
        let json = r#"{
            "resources": [ { "name": "fuel" } ],
            "actions": [
                { "id": "a", "effects": [ { "op": "add", "resource": "ore", "amount": 1 } ] }
            ]
        }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::UnknownResource { resource, .. }) if resource == "ore"
        ));
    }

    #[test]
    fn unknown_resource_in_nested_chance_rejected() {
        let json = r#"{
            "resources": [ { "name": "fuel" } ],
            "actions": [
                {
                    "id": "a",
                    "effects": [
                        {
                            "op": "chance",
                            "p": 0.5,
                            "then": [ { "op": "add", "resource": "ghost", "amount": 1 } ]
                        }
                    ]
                }
            ]
        }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::UnknownResource { resource, .. }) if resource == "ghost"
        ));
    }

    #[test]
    fn probability_outside_unit_interval_rejected() {
        let json = r#"{
            "resources": [ { "name": "fuel" } ],
            "actions": [
                { "id": "a", "effects": [ { "op": "chance", "p": 1.5, "then": [] } ] }
            ]
        }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn zero_total_weight_rejected() {
        let json = r#"{
            "resources": [],
            "event_tables": [
                { "id": "t", "events": [ { "id": "a", "weight": 0.0 }, { "id": "b", "weight": 0.0 } ] }
            ]
        }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::NonPositiveTotalWeight(_))
        ));
    }

    #[test]
    fn empty_table_is_legal() {
        let json = r#"{ "resources": [], "event_tables": [ { "id": "calm", "events": [] } ] }"#;
        assert!(GameConfig::from_json(json).is_ok());
    }

    #[test]
    fn unknown_action_table_rejected() {
        let json = r#"{
            "resources": [],
            "actions": [ { "id": "a", "events": "nowhere" } ]
        }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::UnknownTable { .. })
        ));
    }

    #[test]
    fn negative_cost_rejected() {
        let json = r#"{
            "resources": [ { "name": "fuel" } ],
            "actions": [ { "id": "a", "cost": { "fuel": -3 } } ]
        }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::NegativeCost { .. })
        ));
    }

    #[test]
    fn empty_rule_rejected() {
        let json = r#"{
            "resources": [],
            "rules": [ { "id": "r", "kind": "win", "when": [] } ]
        }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(ConfigError::EmptyRule(_))
        ));
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = GameConfig::from_json(minimal_json()).unwrap();
        let json = serde_json::to_string(&config).expect("serialize");
        let restored = GameConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }
}
