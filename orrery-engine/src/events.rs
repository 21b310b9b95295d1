//! Weighted random event tables.
//!
//! Each table is a weighted pool of occurrences for one situation (deep
//! space, docked, storm season). The turn controller picks which table
//! applies based on the accepted action, then rolls it with the session's
//! event stream.

use crate::effects::EffectOp;
use crate::rng::TurnRng;
use serde::{Deserialize, Serialize};

/// One possible random occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    #[serde(default)]
    pub desc: String,
    /// Selection weight relative to the rest of the table. Zero disables
    /// the entry without removing it.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub effects: Vec<EffectOp>,
}

const fn default_weight() -> f64 {
    1.0
}

/// Explainability telemetry for one weighted roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDecisionTrace {
    /// Identifier of the selection pool.
    pub table: String,
    /// Random draw scaled by the table's total weight.
    pub roll: f64,
    /// Candidate weights considered during selection.
    pub candidates: Vec<CandidateWeight>,
    /// Identifier of the selected candidate.
    pub chosen: String,
}

/// Candidate weight captured during selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateWeight {
    pub id: String,
    pub weight: f64,
}

/// A named weighted pool of events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    pub id: String,
    #[serde(default)]
    pub events: Vec<EventDef>,
}

impl EventTable {
    /// Sum of all event weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.events.iter().map(|event| event.weight).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Cumulative-weight selection: draw `r` in `[0, total)`, walk events
    /// in declared order, return the first whose cumulative weight exceeds
    /// `r`. Ties break on declaration order; zero-weight entries are never
    /// selected.
    ///
    /// Validated tables have a positive total weight, so selection always
    /// succeeds on a non-empty table.
    pub fn roll<R: TurnRng>(&self, rng: &mut R) -> Option<(&EventDef, EventDecisionTrace)> {
        if self.events.is_empty() {
            return None;
        }
        let total = self.total_weight();
        let roll = rng.next_f64() * total;
        let candidates = self
            .events
            .iter()
            .map(|event| CandidateWeight {
                id: event.id.clone(),
                weight: event.weight,
            })
            .collect();

        let mut cumulative = 0.0;
        let mut chosen = None;
        for event in &self.events {
            cumulative += event.weight;
            if cumulative > roll {
                chosen = Some(event);
                break;
            }
        }
        // Float accumulation can land exactly on the total; fall back to
        // the last positively weighted entry.
        let chosen =
            chosen.or_else(|| self.events.iter().rev().find(|event| event.weight > 0.0))?;

        let trace = EventDecisionTrace {
            table: self.id.clone(),
            roll,
            candidates,
            chosen: chosen.id.clone(),
        };
        Some((chosen, trace))
    }
}

/// The set of named event tables declared by one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTableSet {
    tables: Vec<EventTable>,
}

impl EventTableSet {
    #[must_use]
    pub const fn new(tables: Vec<EventTable>) -> Self {
        Self { tables }
    }

    /// Look up a table by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&EventTable> {
        self.tables.iter().find(|table| table.id == id)
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, EventTable> {
        self.tables.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<'a> IntoIterator for &'a EventTableSet {
    type Item = &'a EventTable;
    type IntoIter = std::slice::Iter<'a, EventTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}
