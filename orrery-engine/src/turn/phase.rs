//! Phase-scoped wrappers for the turn pipeline.
//!
//! Each wrapper holds only the slices its phase owns, so phase logic never
//! reaches past its own slice of the session.

use crate::actions::{ActionDef, ActionOutcome, ActionRegistry};
use crate::effects;
use crate::events::{EventDecisionTrace, EventTable};
use crate::facts::{Fact, FactList};
use crate::ledger::{ResourceLedger, UnknownResource};
use crate::rng::StreamBundle;
use crate::rules::{self, TerminationRule};

pub(super) struct ActionPhase<'a> {
    registry: &'a ActionRegistry,
    action: &'a ActionDef,
}

impl<'a> ActionPhase<'a> {
    pub(super) const fn new(registry: &'a ActionRegistry, action: &'a ActionDef) -> Self {
        Self { registry, action }
    }

    pub(super) fn run(
        &self,
        ledger: &mut ResourceLedger,
        streams: &mut StreamBundle,
    ) -> Result<ActionOutcome, UnknownResource> {
        self.registry.invoke(self.action, ledger, streams.effects())
    }
}

pub(super) struct EventPhase<'a> {
    table: Option<&'a EventTable>,
}

impl<'a> EventPhase<'a> {
    pub(super) const fn new(table: Option<&'a EventTable>) -> Self {
        Self { table }
    }

    /// Roll the contextual table and apply the selected event's effects.
    /// Returns the chosen event id and its decision trace, or `None` when
    /// no table applies this turn.
    pub(super) fn run(
        &self,
        ledger: &mut ResourceLedger,
        streams: &mut StreamBundle,
        facts: &mut FactList,
    ) -> Result<Option<(String, EventDecisionTrace)>, UnknownResource> {
        let Some(table) = self.table else {
            return Ok(None);
        };
        let Some((event, trace)) = table.roll(streams.events()) else {
            return Ok(None);
        };
        facts.push(Fact::EventStruck {
            event: event.id.clone(),
            table: table.id.clone(),
        });
        effects::run_program(&event.effects, ledger, streams.effects(), facts)?;
        Ok(Some((event.id.clone(), trace)))
    }
}

pub(super) struct TerminationPhase<'a> {
    rules: &'a [TerminationRule],
}

impl<'a> TerminationPhase<'a> {
    pub(super) const fn new(rules: &'a [TerminationRule]) -> Self {
        Self { rules }
    }

    pub(super) fn run(
        &self,
        ledger: &ResourceLedger,
        turn: u32,
    ) -> Result<Option<&'a TerminationRule>, UnknownResource> {
        rules::evaluate(self.rules, ledger, turn)
    }
}
