//! Orrery Turn Engine
//!
//! Deterministic, configuration-driven core for turn-based console
//! resource-management games. One engine replaces the per-game loop: named
//! clamped resources, precondition-gated actions, weighted random event
//! tables, and ordered win/loss rules, all replayable from a single seed.
//! This crate provides all game mechanics without UI or platform-specific
//! dependencies.

pub mod actions;
pub mod config;
pub mod effects;
pub mod events;
pub mod facts;
pub mod ledger;
pub mod numbers;
pub mod rng;
pub mod rules;
pub mod seed;
pub mod session;
pub mod turn;

// Re-export commonly used types
pub use actions::{ActionDef, ActionOutcome, ActionRegistry, RejectReason, Requirement};
pub use config::{ConfigError, GameConfig, GameMeta};
pub use effects::{EffectOp, run_program};
pub use events::{CandidateWeight, EventDecisionTrace, EventDef, EventTable, EventTableSet};
pub use facts::{Fact, FactList, FactSeverity};
pub use ledger::{
    Applied, ClampEdge, Comparator, ResourceDef, ResourceLedger, ResourceSlot, UnknownResource,
};
pub use rng::{CountingRng, StreamBundle, StreamDrawCounts, StreamPositions, TurnRng};
pub use rules::{RuleKind, TerminationRule, Trigger};
pub use seed::{decode_to_seed, encode_friendly, generate_code_from_entropy};
pub use session::{
    GameSession, SessionSnapshot, SessionStatus, SessionStore, StatusView, TurnRecord,
};
pub use turn::{EngineError, TurnController, TurnOutcome, TurnPhase, TurnReport};

use std::sync::Arc;

/// Trait for abstracting where game configurations come from.
/// Platform-specific implementations should provide this.
pub trait ConfigSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the raw configuration JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    fn load_config_json(&self) -> Result<String, Self::Error>;
}

/// Main engine for one configured game.
///
/// Holds the validated, read-only config behind an `Arc`; cloning the
/// engine is cheap and the clone can serve sessions on another thread.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Arc<GameConfig>,
}

impl Engine {
    /// Validate a config and build an engine around it. This is the only
    /// point where a [`ConfigError`] can surface; afterwards sessions
    /// cannot hit configuration problems.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first violation found.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Parse, validate, and wrap a JSON config.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for malformed JSON or schema violations.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::new(GameConfig::from_json(json)?)
    }

    /// Load a config through a [`ConfigSource`].
    ///
    /// # Errors
    ///
    /// Returns an error when the source fails or the config is invalid.
    pub fn from_source<S>(source: &S) -> Result<Self, anyhow::Error>
    where
        S: ConfigSource,
        S::Error: Into<anyhow::Error>,
    {
        let json = source.load_config_json().map_err(Into::into)?;
        Ok(Self::from_json(&json)?)
    }

    /// The validated configuration this engine serves.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Start a fresh, isolated session from a user seed.
    #[must_use]
    pub fn create_session(&self, seed: u64) -> GameSession {
        GameSession::new(&self.config, seed)
    }

    /// Rebuild a session from a persisted snapshot.
    #[must_use]
    pub fn resume_session(&self, snapshot: SessionSnapshot) -> GameSession {
        GameSession::restore(snapshot)
    }

    /// Read-only projection of a session for display.
    #[must_use]
    pub fn status(&self, session: &GameSession) -> StatusView {
        session.status_view()
    }

    /// Ids of the actions whose preconditions and costs currently hold,
    /// in declaration order. Empty once the session has ended.
    ///
    /// Submitting an action not in this list yields a rejection, never a
    /// ledger mutation.
    #[must_use]
    pub fn available_actions(&self, session: &GameSession) -> Vec<String> {
        if session.status().is_over() {
            return Vec::new();
        }
        self.config
            .actions
            .iter()
            .filter(|action| {
                matches!(
                    self.config.actions.check(action, session.ledger()),
                    Ok(None)
                )
            })
            .map(|action| action.id.clone())
            .collect()
    }

    /// Resolve one action request against a session.
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
        TurnController::new(&self.config).submit(session, action_id)
    }
}
