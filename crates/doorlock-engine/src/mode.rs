//! Administrative mode state.
//!
//! The controller is in exactly one of three modes:
//!
//! - `Idle`: presentations only resolve and log
//! - `Learning`: the next unknown card is enrolled as a user
//! - `Deleting`: the next known card other than the initiator is removed
//!
//! Learning and deleting exclude each other. Toggling one while the other
//! is active does nothing.
//!
//! # Examples
//!
//! ```
//! use doorlock_engine::{AdminMode, ModeController};
//! use doorlock_core::CardId;
//!
//! let programming = CardId::new(711223556);
//! let mut modes = ModeController::new();
//!
//! assert!(modes.toggle_learning(programming));
//! assert_eq!(modes.mode(), AdminMode::Learning);
//!
//! // Deleting cannot start while learning.
//! assert!(!modes.toggle_deleting(CardId::new(709711364)));
//!
//! assert!(modes.toggle_learning(programming));
//! assert_eq!(modes.mode(), AdminMode::Idle);
//! assert_eq!(modes.history().len(), 2);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use doorlock_core::CardId;
use doorlock_core::constants::MODE_HISTORY_SIZE;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Current administrative mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum AdminMode {
    #[default]
    Idle,

    Learning,

    /// Removal mode, started by `initiator`. The initiator's own card is
    /// never removed while this mode is active.
    Deleting { initiator: CardId },
}

impl fmt::Display for AdminMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminMode::Idle => write!(f, "idle"),
            AdminMode::Learning => write!(f, "learning"),
            AdminMode::Deleting { initiator } => write!(f, "deleting (initiator {initiator})"),
        }
    }
}

/// A recorded mode change.
///
/// `at` is process-local and not serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeTransition {
    pub from: AdminMode,
    pub to: AdminMode,
    /// Card whose presentation caused the change.
    pub cause: CardId,
    #[serde(skip, default = "Instant::now")]
    pub at: Instant,
}

/// Mode state plus a bounded transition history.
///
/// Cloning is how the engine stages changes: it mutates a copy during a
/// presentation and keeps it only if the presentation succeeds.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: AdminMode,
    history: VecDeque<ModeTransition>,
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            mode: AdminMode::Idle,
            history: VecDeque::with_capacity(MODE_HISTORY_SIZE),
        }
    }

    pub fn mode(&self) -> AdminMode {
        self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == AdminMode::Idle
    }

    pub fn is_learning(&self) -> bool {
        self.mode == AdminMode::Learning
    }

    pub fn is_deleting(&self) -> bool {
        matches!(self.mode, AdminMode::Deleting { .. })
    }

    /// Card that started the current deleting mode.
    pub fn deleting_initiator(&self) -> Option<CardId> {
        match self.mode {
            AdminMode::Deleting { initiator } => Some(initiator),
            _ => None,
        }
    }

    /// Flip learning on or off. Returns `false` (and does nothing) while
    /// deleting.
    pub fn toggle_learning(&mut self, cause: CardId) -> bool {
        match self.mode {
            AdminMode::Idle => self.transition(AdminMode::Learning, cause),
            AdminMode::Learning => self.transition(AdminMode::Idle, cause),
            AdminMode::Deleting { .. } => return false,
        }
        true
    }

    /// Flip deleting on or off, recording `initiator` on entry. Returns
    /// `false` (and does nothing) while learning.
    pub fn toggle_deleting(&mut self, initiator: CardId) -> bool {
        match self.mode {
            AdminMode::Idle => self.transition(AdminMode::Deleting { initiator }, initiator),
            AdminMode::Deleting { .. } => self.transition(AdminMode::Idle, initiator),
            AdminMode::Learning => return false,
        }
        true
    }

    /// Leave learning mode. No-op in any other mode.
    pub fn exit_learning(&mut self, cause: CardId) {
        if self.is_learning() {
            self.transition(AdminMode::Idle, cause);
        }
    }

    /// Leave deleting mode. No-op in any other mode.
    pub fn exit_deleting(&mut self, cause: CardId) {
        if self.is_deleting() {
            self.transition(AdminMode::Idle, cause);
        }
    }

    /// Recorded transitions, oldest first.
    pub fn history(&self) -> &VecDeque<ModeTransition> {
        &self.history
    }

    fn transition(&mut self, to: AdminMode, cause: CardId) {
        let from = self.mode;
        self.mode = to;

        if self.history.len() >= MODE_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(ModeTransition {
            from,
            to,
            cause,
            at: Instant::now(),
        });

        info!(%from, %to, card_id = %cause, "mode changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROG: CardId = CardId::new(100);
    const DEL: CardId = CardId::new(200);

    #[test]
    fn test_starts_idle() {
        let modes = ModeController::new();
        assert!(modes.is_idle());
        assert!(modes.history().is_empty());
    }

    #[test]
    fn test_learning_toggles() {
        let mut modes = ModeController::new();
        assert!(modes.toggle_learning(PROG));
        assert!(modes.is_learning());
        assert!(modes.toggle_learning(PROG));
        assert!(modes.is_idle());
    }

    #[test]
    fn test_deleting_records_initiator() {
        let mut modes = ModeController::new();
        assert!(modes.toggle_deleting(DEL));
        assert_eq!(modes.deleting_initiator(), Some(DEL));
        assert_eq!(modes.mode(), AdminMode::Deleting { initiator: DEL });
    }

    #[test]
    fn test_learning_blocked_while_deleting() {
        let mut modes = ModeController::new();
        modes.toggle_deleting(DEL);

        assert!(!modes.toggle_learning(PROG));
        assert!(modes.is_deleting());
        assert_eq!(modes.history().len(), 1);
    }

    #[test]
    fn test_deleting_blocked_while_learning() {
        let mut modes = ModeController::new();
        modes.toggle_learning(PROG);

        assert!(!modes.toggle_deleting(DEL));
        assert!(modes.is_learning());
        assert_eq!(modes.deleting_initiator(), None);
    }

    #[test]
    fn test_any_delete_card_ends_deleting() {
        let mut modes = ModeController::new();
        modes.toggle_deleting(DEL);
        modes.toggle_deleting(CardId::new(201));
        assert!(modes.is_idle());
    }

    #[test]
    fn test_exit_only_leaves_matching_mode() {
        let mut modes = ModeController::new();
        modes.toggle_learning(PROG);

        modes.exit_deleting(PROG);
        assert!(modes.is_learning());

        modes.exit_learning(PROG);
        assert!(modes.is_idle());

        modes.exit_learning(PROG);
        assert_eq!(modes.history().len(), 2);
    }

    #[test]
    fn test_history_records_cause() {
        let mut modes = ModeController::new();
        modes.toggle_learning(PROG);

        let transition = &modes.history()[0];
        assert_eq!(transition.from, AdminMode::Idle);
        assert_eq!(transition.to, AdminMode::Learning);
        assert_eq!(transition.cause, PROG);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut modes = ModeController::new();
        for _ in 0..(MODE_HISTORY_SIZE + 11) {
            modes.toggle_learning(PROG);
        }

        assert_eq!(modes.history().len(), MODE_HISTORY_SIZE);
        // The oldest kept entry is the 12th toggle, which returns to idle.
        assert_eq!(modes.history()[0].to, AdminMode::Idle);
        assert!(modes.is_learning());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut modes = ModeController::new();
        let mut staged = modes.clone();
        staged.toggle_learning(PROG);

        assert!(modes.is_idle());
        modes = staged;
        assert!(modes.is_learning());
    }

    #[test]
    fn test_mode_serde() {
        let json = serde_json::to_string(&AdminMode::Deleting { initiator: DEL }).unwrap();
        assert_eq!(json, r#"{"mode":"deleting","initiator":200}"#);
        assert_eq!(
            serde_json::from_str::<AdminMode>(r#"{"mode":"idle"}"#).unwrap(),
            AdminMode::Idle
        );
    }
}
