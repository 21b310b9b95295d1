//! Session state: one independent play-through.
//!
//! A session owns its ledger and random streams outright; nothing is shared
//! between sessions, so any number of them can run concurrently against the
//! same read-only config.

use crate::config::GameConfig;
use crate::facts::FactList;
use crate::ledger::{ResourceLedger, ResourceSlot};
use crate::rng::{StreamBundle, StreamDrawCounts, StreamPositions};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Running,
    Won,
    Lost,
}

impl SessionStatus {
    /// Whether the session has left `Running`.
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Append-only record of one consumed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// One-based turn counter.
    pub turn: u32,
    pub action: String,
    /// Event selected by the contextual table roll, when one applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    pub facts: FactList,
}

/// Read-only projection of a session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub turn: u32,
    pub status: SessionStatus,
    pub resources: Vec<ResourceSlot>,
    pub draws: StreamDrawCounts,
}

/// One independent, isolated play-through.
#[derive(Debug, Clone)]
pub struct GameSession {
    seed: u64,
    ledger: ResourceLedger,
    streams: StreamBundle,
    turn: u32,
    status: SessionStatus,
    /// Id of the termination rule that ended the session.
    ended_by: Option<String>,
    history: Vec<TurnRecord>,
}

impl GameSession {
    /// Start a fresh session from a config and user seed.
    #[must_use]
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        Self {
            seed,
            ledger: ResourceLedger::from_defs(&config.resources),
            streams: StreamBundle::from_user_seed(seed),
            turn: 0,
            status: SessionStatus::Running,
            ended_by: None,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Rule id that ended the session, once status leaves `Running`.
    #[must_use]
    pub fn ended_by(&self) -> Option<&str> {
        self.ended_by.as_deref()
    }

    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Consumed turns in order.
    #[must_use]
    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    /// Read-only projection for display.
    #[must_use]
    pub fn status_view(&self) -> StatusView {
        StatusView {
            turn: self.turn,
            status: self.status,
            resources: self.ledger.slots().to_vec(),
            draws: self.streams.draw_counts(),
        }
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut ResourceLedger, &mut StreamBundle) {
        (&mut self.ledger, &mut self.streams)
    }

    pub(crate) fn begin_turn(&mut self) -> u32 {
        self.turn += 1;
        self.turn
    }

    pub(crate) fn end(&mut self, status: SessionStatus, rule: &str) {
        self.status = status;
        self.ended_by = Some(rule.to_string());
    }

    pub(crate) fn record(&mut self, record: TurnRecord) {
        self.history.push(record);
    }

    /// Capture the full session for persistence.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            seed: self.seed,
            turn: self.turn,
            status: self.status,
            ended_by: self.ended_by.clone(),
            resources: self.ledger.slots().to_vec(),
            streams: self.streams.positions(),
            draws: self.streams.draw_counts(),
            history: self.history.clone(),
        }
    }

    /// Rebuild a session from a snapshot. Subsequent turns continue the
    /// captured random streams exactly where they left off.
    #[must_use]
    pub fn restore(snapshot: SessionSnapshot) -> Self {
        Self {
            seed: snapshot.seed,
            ledger: ResourceLedger::from_slots(snapshot.resources),
            streams: StreamBundle::restore(snapshot.seed, snapshot.streams, snapshot.draws),
            turn: snapshot.turn,
            status: snapshot.status,
            ended_by: snapshot.ended_by,
            history: snapshot.history,
        }
    }
}

/// Serializable capture of a whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub seed: u64,
    pub turn: u32,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_by: Option<String>,
    pub resources: Vec<ResourceSlot>,
    pub streams: StreamPositions,
    #[serde(default)]
    pub draws: StreamDrawCounts,
    #[serde(default)]
    pub history: Vec<TurnRecord>,
}

/// Trait for abstracting snapshot persistence.
/// Platform-specific implementations should provide this.
pub trait SessionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a snapshot under a name.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save(&self, name: &str, snapshot: &SessionSnapshot) -> Result<(), Self::Error>;

    /// Load a snapshot by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load(&self, name: &str) -> Result<Option<SessionSnapshot>, Self::Error>;

    /// Delete a saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    fn delete(&self, name: &str) -> Result<(), Self::Error>;
}
