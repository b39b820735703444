//! Shared state and DTOs for a hosting UI.
//!
//! The session pushes its results on an mpsc channel (the push path); a
//! polling UI additionally snapshots the shared [`MoatAppState`] here
//! (the poll path).  Only this module references both the application
//! layer and a presentation surface.
//!
//! # Async Mutex vs std Mutex
//!
//! `MoatAppState` uses `tokio::sync::Mutex` because the snapshot accessors
//! are `async` functions.  Holding a `std::sync::Mutex` guard across an
//! `.await` point would block the Tokio thread pool; the async mutex
//! suspends the task instead.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use moat_core::TorStatus;

use crate::application::session::{SessionEvent, SessionPhase};

// ── Shared application state ──────────────────────────────────────────────────

/// Runtime state shared between the session driver and a polling UI.
pub struct MoatAppState {
    /// Latest network status delivered by the collaborator.
    pub tor_status: Mutex<TorStatus>,
    /// Latest session phase.
    pub phase: Mutex<SessionPhase>,
    /// Message of the last terminal failure, if any.
    pub last_error: Mutex<Option<String>>,
    /// Number of bridge lines received by the last completed attempt.
    pub bridge_count: Mutex<usize>,
}

impl MoatAppState {
    /// Creates a fresh state: no status delivered, session idle.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Records the latest delivered network status.
    pub async fn note_status(&self, status: TorStatus) {
        let mut guard = self.tor_status.lock().await;
        *guard = status;
    }

    /// Records the latest session phase.
    pub async fn note_phase(&self, phase: SessionPhase) {
        let mut guard = self.phase.lock().await;
        *guard = phase;
    }

    /// Folds a session event into the snapshot state.
    pub async fn apply_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::CaptchaReady { .. } => {
                let mut error = self.last_error.lock().await;
                *error = None;
            }
            SessionEvent::Completed { bridge_lines } => {
                let mut count = self.bridge_count.lock().await;
                *count = bridge_lines.len();
            }
            SessionEvent::Failed { message } => {
                let mut error = self.last_error.lock().await;
                *error = Some(message.clone());
            }
        }
    }
}

impl Default for MoatAppState {
    fn default() -> Self {
        Self {
            tor_status: Mutex::new(TorStatus::Unknown),
            phase: Mutex::new(SessionPhase::Idle),
            last_error: Mutex::new(None),
            bridge_count: Mutex::new(0),
        }
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Full status snapshot returned to a polling UI.
///
/// Enum fields are serialized as their `Debug` names (e.g. `"On"`,
/// `"CaptchaDisplayed"`); the UI treats them as string literals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusDto {
    pub tor_status: String,
    pub phase: String,
    pub last_error: Option<String>,
    pub bridge_count: usize,
}

/// Unified response wrapper for UI commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    /// Constructs a successful result containing `data`.
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// Constructs an error result containing the given message.
    pub fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns the current session status snapshot.
///
/// Called periodically by the UI; each lock is held only while reading.
pub async fn get_session_status(state: Arc<MoatAppState>) -> CommandResult<SessionStatusDto> {
    let status = state.tor_status.lock().await;
    let phase = state.phase.lock().await;
    let error = state.last_error.lock().await;
    let count = state.bridge_count.lock().await;

    CommandResult::ok(SessionStatusDto {
        tor_status: format!("{status:?}"),
        phase: format!("{phase:?}"),
        last_error: error.clone(),
        bridge_count: *count,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
