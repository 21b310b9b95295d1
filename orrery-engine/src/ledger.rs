//! Named resource counters with clamped bounds.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Comparison operator used by requirements and termination triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Comparator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Gt => ">",
        }
    }

    /// Evaluate `lhs <op> rhs`.
    #[must_use]
    pub const fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Ge => lhs >= rhs,
            Self::Gt => lhs > rhs,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which bound a clamped mutation hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampEdge {
    Floor,
    Ceiling,
}

/// Declaration of a single tracked resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDef {
    pub name: String,
    #[serde(default)]
    pub initial: i64,
    /// Inclusive lower bound; absent means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    /// Inclusive upper bound; absent means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

/// One resource counter with its live value and declared bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSlot {
    pub name: String,
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl ResourceSlot {
    fn clamp(&self, raw: i64) -> (i64, Option<ClampEdge>) {
        if let Some(min) = self.min
            && raw < min
        {
            return (min, Some(ClampEdge::Floor));
        }
        if let Some(max) = self.max
            && raw > max
        {
            return (max, Some(ClampEdge::Ceiling));
        }
        (raw, None)
    }
}

/// Result of a ledger mutation: the post-clamp value and which bound, if
/// any, the raw result hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub value: i64,
    pub clamped: Option<ClampEdge>,
}

/// Referencing a resource name that was never declared. Configuration
/// validation makes this unreachable during normal turns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource `{0}`")]
pub struct UnknownResource(pub String);

/// Name-addressed counters in declaration order.
///
/// Iteration and snapshot order always match declaration order, which keeps
/// serialized session state deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLedger {
    slots: Vec<ResourceSlot>,
}

impl ResourceLedger {
    /// Build a ledger from resource declarations, clamping initial values
    /// into bounds.
    #[must_use]
    pub fn from_defs(defs: &[ResourceDef]) -> Self {
        let slots = defs
            .iter()
            .map(|def| {
                let mut slot = ResourceSlot {
                    name: def.name.clone(),
                    value: def.initial,
                    min: def.min,
                    max: def.max,
                };
                slot.value = slot.clamp(def.initial).0;
                slot
            })
            .collect();
        Self { slots }
    }

    /// Rebuild a ledger from snapshot slots.
    #[must_use]
    pub const fn from_slots(slots: Vec<ResourceSlot>) -> Self {
        Self { slots }
    }

    fn slot(&self, name: &str) -> Result<&ResourceSlot, UnknownResource> {
        self.slots
            .iter()
            .find(|slot| slot.name == name)
            .ok_or_else(|| UnknownResource(name.to_string()))
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut ResourceSlot, UnknownResource> {
        self.slots
            .iter_mut()
            .find(|slot| slot.name == name)
            .ok_or_else(|| UnknownResource(name.to_string()))
    }

    /// Add `delta` to the named resource, clamping into declared bounds.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownResource`] when the name was never declared.
    pub fn apply(&mut self, name: &str, delta: i64) -> Result<Applied, UnknownResource> {
        let slot = self.slot_mut(name)?;
        let raw = slot.value.saturating_add(delta);
        let (value, clamped) = slot.clamp(raw);
        slot.value = value;
        Ok(Applied { value, clamped })
    }

    /// Overwrite the named resource, clamping into declared bounds.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownResource`] when the name was never declared.
    pub fn set(&mut self, name: &str, value: i64) -> Result<Applied, UnknownResource> {
        let slot = self.slot_mut(name)?;
        let (value, clamped) = slot.clamp(value);
        slot.value = value;
        Ok(Applied { value, clamped })
    }

    /// Current value of the named resource.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownResource`] when the name was never declared.
    pub fn get(&self, name: &str) -> Result<i64, UnknownResource> {
        self.slot(name).map(|slot| slot.value)
    }

    /// Evaluate `resource <cmp> threshold` for precondition checks.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownResource`] when the name was never declared.
    pub fn meets(
        &self,
        name: &str,
        cmp: Comparator,
        threshold: i64,
    ) -> Result<bool, UnknownResource> {
        Ok(cmp.holds(self.get(name)?, threshold))
    }

    /// Lowest value the named resource may spend down to.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownResource`] when the name was never declared.
    pub fn floor(&self, name: &str) -> Result<Option<i64>, UnknownResource> {
        self.slot(name).map(|slot| slot.min)
    }

    /// Slots in declaration order.
    #[must_use]
    pub fn slots(&self) -> &[ResourceSlot] {
        &self.slots
    }

    /// Consume the ledger, returning its slots for snapshotting.
    #[must_use]
    pub fn into_slots(self) -> Vec<ResourceSlot> {
        self.slots
    }
}
