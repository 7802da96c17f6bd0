//! Session phase state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a session is in its study flow.
///
/// ```text
/// selecting -> active <-> generating -> idle | errored
///                 ^                        |
///                 +------ generating <-----+
/// ```
///
/// No phase is terminal while the tab is open; `errored` recovers by
/// starting a new generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Choosing a concrete challenge or plan.
    Selecting,
    /// Committed, waiting for the next user turn or generation.
    Active,
    /// A generation is in flight.
    Generating,
    /// Last generation finished; nothing more expected.
    Idle,
    /// Last generation failed mid-stream.
    Errored,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Selecting => "selecting",
            SessionPhase::Active => "active",
            SessionPhase::Generating => "generating",
            SessionPhase::Idle => "idle",
            SessionPhase::Errored => "errored",
        }
    }

    /// Whether a generation may start from this phase.
    pub fn can_start_generation(&self) -> bool {
        matches!(
            self,
            SessionPhase::Active | SessionPhase::Idle | SessionPhase::Errored
        )
    }

    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        match (self, next) {
            (Generating, Active | Idle | Errored) => true,
            (from, Generating) => from.can_start_generation(),
            (Selecting, Active) => true,
            (Active | Idle | Errored, Selecting) => true,
            (Idle | Errored, Active) => true,
            (Active, Idle) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::SessionPhase::*;

    #[test]
    fn test_generation_cycle_transitions() {
        assert!(Selecting.can_transition_to(Active));
        assert!(Active.can_transition_to(Generating));
        assert!(Generating.can_transition_to(Active));
        assert!(Generating.can_transition_to(Idle));
        assert!(Generating.can_transition_to(Errored));
        assert!(Errored.can_transition_to(Generating));
        assert!(Idle.can_transition_to(Generating));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!Selecting.can_transition_to(Generating));
        assert!(!Generating.can_transition_to(Generating));
        assert!(!Generating.can_transition_to(Selecting));
        assert!(!Selecting.can_transition_to(Idle));
    }
}
