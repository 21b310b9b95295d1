//! Turn orchestration: one complete action, event, and termination cycle.
//!
//! A turn only exists once an action is accepted. Rejected or unknown
//! requests leave the machine in `AwaitingAction` without consuming a turn;
//! the caller decides whether and how to re-prompt.

mod phase;

use crate::actions::{ActionOutcome, RejectReason};
use crate::config::GameConfig;
use crate::events::EventDecisionTrace;
use crate::facts::{Fact, FactList};
use crate::ledger::UnknownResource;
use crate::rules::RuleKind;
use crate::session::{GameSession, SessionStatus, TurnRecord};
use phase::{ActionPhase, EventPhase, TerminationPhase};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// States of the per-turn machine. Between `submit` calls a session is
/// always in `AwaitingAction` or `Ended`; the middle states are passed
/// through while a turn resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    AwaitingAction,
    ActionResolved,
    EventResolved,
    TerminationChecked,
    Ended,
}

impl TurnPhase {
    const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::AwaitingAction, Self::ActionResolved)
                | (Self::ActionResolved, Self::EventResolved)
                | (Self::EventResolved, Self::TerminationChecked)
                | (Self::TerminationChecked, Self::AwaitingAction | Self::Ended)
        )
    }

    fn advance(&mut self, next: Self) {
        debug_assert!(
            self.can_advance_to(next),
            "illegal turn phase transition {self:?} -> {next:?}"
        );
        *self = next;
    }
}

/// Caller-level failures. Neither consumes a turn nor mutates the ledger.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The submitted id is not in the action registry. Repeated occurrences
    /// indicate a broken presentation layer, not an engine fault.
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    /// The session already ended; it is immutable now.
    #[error("session already ended ({0:?})")]
    SessionOver(SessionStatus),
    /// An undeclared resource name surfaced mid-turn. Config validation
    /// checks every reference, so this indicates a session restored against
    /// a config it was not built from.
    #[error(transparent)]
    Ledger(#[from] UnknownResource),
}

/// How one submitted action resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The action was accepted and a full turn was consumed.
    Accepted {
        /// Event selected by the contextual table, when one applied.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<String>,
        /// Selection telemetry for the event roll.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trace: Option<EventDecisionTrace>,
        facts: FactList,
    },
    /// The action was turned down; no turn was consumed.
    Rejected { reason: RejectReason },
}

/// Result of one `submit` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    /// Turn number consumed by an accepted action, or the current turn
    /// counter for a rejection.
    pub turn: u32,
    pub action: String,
    pub outcome: TurnOutcome,
    pub status: SessionStatus,
}

impl TurnReport {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self.outcome, TurnOutcome::Accepted { .. })
    }

    /// Facts emitted this turn; empty for rejections.
    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        match &self.outcome {
            TurnOutcome::Accepted { facts, .. } => facts,
            TurnOutcome::Rejected { .. } => &[],
        }
    }
}

/// Orchestrates turns for sessions of one configured game.
#[derive(Debug, Clone, Copy)]
pub struct TurnController<'a> {
    config: &'a GameConfig,
}

impl<'a> TurnController<'a> {
    #[must_use]
    pub const fn new(config: &'a GameConfig) -> Self {
        Self { config }
    }

    /// Resolve one action request: invoke the action, roll the contextual
    /// event table, evaluate termination rules. The whole cycle completes
    /// before this returns; no partial-turn state is ever observable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAction`] for unregistered ids and
    /// [`EngineError::SessionOver`] once the session has ended.
    pub fn submit(
        &self,
        session: &mut GameSession,
        action_id: &str,
    ) -> Result<TurnReport, EngineError> {
        if session.status().is_over() {
            return Err(EngineError::SessionOver(session.status()));
        }
        let action = self
            .config
            .actions
            .get(action_id)
            .ok_or_else(|| EngineError::UnknownAction(action_id.to_string()))?;

        let mut machine = TurnPhase::AwaitingAction;

        let (ledger, streams) = session.parts_mut();
        let outcome = ActionPhase::new(&self.config.actions, action).run(ledger, streams)?;
        let mut facts = match outcome {
            ActionOutcome::Rejected { reason } => {
                // Stay in AwaitingAction; invalid or unaffordable choices
                // re-prompt without penalty.
                return Ok(TurnReport {
                    turn: session.turn(),
                    action: action_id.to_string(),
                    outcome: TurnOutcome::Rejected { reason },
                    status: session.status(),
                });
            }
            ActionOutcome::Accepted { facts } => facts,
        };
        let turn = session.begin_turn();
        machine.advance(TurnPhase::ActionResolved);

        let table = self.config.table_for(action);
        let (ledger, streams) = session.parts_mut();
        let rolled = EventPhase::new(table).run(ledger, streams, &mut facts)?;
        let (event, trace) = match rolled {
            Some((event, trace)) => (Some(event), Some(trace)),
            None => (None, None),
        };
        machine.advance(TurnPhase::EventResolved);

        let matched = TerminationPhase::new(&self.config.rules).run(session.ledger(), turn)?;
        machine.advance(TurnPhase::TerminationChecked);
        if let Some(rule) = matched {
            let status = match rule.kind {
                RuleKind::Win => SessionStatus::Won,
                RuleKind::Loss => SessionStatus::Lost,
            };
            session.end(status, &rule.id);
            facts.push(Fact::SessionEnded {
                status,
                rule: rule.id.clone(),
            });
            machine.advance(TurnPhase::Ended);
        } else {
            machine.advance(TurnPhase::AwaitingAction);
        }

        session.record(TurnRecord {
            turn,
            action: action_id.to_string(),
            event: event.clone(),
            facts: facts.clone(),
        });

        Ok(TurnReport {
            turn,
            action: action_id.to_string(),
            outcome: TurnOutcome::Accepted {
                event,
                trace,
                facts,
            },
            status: session.status(),
        })
    }
}
