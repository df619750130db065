//! Game state and core types
//!
//! Everything a host needs to render or persist a game lives here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::lerp_clamped;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Fresh engine, no round played yet
    #[default]
    Idle,
    /// Holding a score, deciding between Stop and Double
    Choosing,
    /// A challenge is running and its timeout is pending
    InChallenge,
    /// Round ended (banked or lost)
    GameOver,
}

/// Challenge variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeKind {
    /// Tap a shrinking target before time runs out
    Precision,
    /// Tap while a progress bar is inside the sweet spot
    Timing,
}

impl ChallengeKind {
    pub const ALL: [ChallengeKind; 2] = [ChallengeKind::Precision, ChallengeKind::Timing];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeKind::Precision => "Precision",
            ChallengeKind::Timing => "Timing",
        }
    }
}

/// Shrinking target geometry for a precision challenge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionTarget {
    /// Target centre inside the safe area
    pub center: Vec2,
    pub initial_size: f32,
    pub final_size: f32,
}

/// Parameters of the challenge currently being played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeParams {
    pub kind: ChallengeKind,
    /// Difficulty the parameters were derived from
    pub difficulty: u32,
    /// Engine clock reading when the challenge began
    pub started_at_ms: u64,
    /// Shrink/progress duration
    pub duration_ms: u64,
    /// Delay after start at which the challenge auto-fails
    pub timeout_ms: u64,
    /// Present only for [`ChallengeKind::Precision`]
    pub target: Option<PrecisionTarget>,
}

impl ChallengeParams {
    /// Milliseconds since start, clamped to zero if the clock went backwards
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms)
    }

    /// Progress fraction in [0, 1]
    pub fn progress_at(&self, elapsed_ms: u64) -> f64 {
        progress(elapsed_ms, self.duration_ms)
    }

    /// Current precision target size, or `None` for other kinds
    pub fn target_size_at(&self, elapsed_ms: u64) -> Option<f32> {
        self.target.map(|t| {
            lerp_clamped(
                t.initial_size,
                t.final_size,
                self.progress_at(elapsed_ms) as f32,
            )
        })
    }

    /// Absolute clock reading at which the timeout fires
    pub fn deadline_ms(&self) -> u64 {
        self.started_at_ms.saturating_add(self.timeout_ms)
    }
}

/// `elapsed / duration` clamped to [0, 1]; a zero duration counts as complete
pub fn progress(elapsed_ms: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 1.0;
    }
    (elapsed_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
}

/// Complete mutable game state owned by one engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub phase: GamePhase,
    /// Score at stake (0 when idle or after a loss)
    pub score: u64,
    /// Highest score reached this run; never decreases
    pub best_score: u64,
    /// Starts at 1, +1 per successful challenge
    pub difficulty: u32,
    /// Some iff `phase == InChallenge`
    pub challenge: Option<ChallengeParams>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            score: 0,
            best_score: 0,
            difficulty: 1,
            challenge: None,
        }
    }
}

impl Session {
    /// Raise the best score if `score` beats it
    pub fn record_best(&mut self, score: u64) -> bool {
        if score > self.best_score {
            self.best_score = score;
            true
        } else {
            false
        }
    }
}

/// Player operations, used when reporting ignored events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    StartGame,
    Stop,
    Double,
    Attempt,
    Timeout,
}

/// Why a challenge failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureCause {
    /// An attempt arrived but the judge rejected it
    Missed,
    /// No attempt before the timeout
    TimedOut,
}

/// Events emitted to the presentation layer after every applied transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new round started with score 1
    ScoreChanged { score: u64 },
    /// The player stopped and locked in `score`
    RoundBanked { score: u64, new_best: bool },
    ChallengeStarted { challenge: ChallengeParams },
    ChallengeSucceeded {
        kind: ChallengeKind,
        elapsed_ms: u64,
        score: u64,
        difficulty: u32,
    },
    ChallengeFailed {
        kind: ChallengeKind,
        cause: FailureCause,
        /// Score that was at stake
        lost_score: u64,
        /// `None` when the challenge timed out
        elapsed_ms: Option<u64>,
    },
}

/// One applied state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: GamePhase,
    pub to: GamePhase,
    pub event: GameEvent,
    /// Session after the transition
    pub session: Session,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precision(duration_ms: u64) -> ChallengeParams {
        ChallengeParams {
            kind: ChallengeKind::Precision,
            difficulty: 1,
            started_at_ms: 1000,
            duration_ms,
            timeout_ms: duration_ms + 500,
            target: Some(PrecisionTarget {
                center: Vec2::new(100.0, 100.0),
                initial_size: 185.0,
                final_size: 110.0,
            }),
        }
    }

    #[test]
    fn test_progress_clamps() {
        assert_eq!(progress(0, 1000), 0.0);
        assert_eq!(progress(500, 1000), 0.5);
        assert_eq!(progress(5000, 1000), 1.0);
        assert_eq!(progress(10, 0), 1.0);
    }

    #[test]
    fn test_elapsed_clamps_on_clock_skew() {
        let params = precision(1900);
        assert_eq!(params.elapsed_ms(400), 0);
        assert_eq!(params.elapsed_ms(1250), 250);
        assert_eq!(params.deadline_ms(), 1000 + 2400);
    }

    #[test]
    fn test_target_shrinks_linearly_then_holds() {
        let params = precision(1000);
        assert_eq!(params.target_size_at(0), Some(185.0));
        assert_eq!(params.target_size_at(500), Some(147.5));
        assert_eq!(params.target_size_at(1000), Some(110.0));
        assert_eq!(params.target_size_at(1400), Some(110.0));
    }

    #[test]
    fn test_timing_has_no_target_size() {
        let params = ChallengeParams {
            kind: ChallengeKind::Timing,
            target: None,
            ..precision(1000)
        };
        assert_eq!(params.target_size_at(300), None);
    }

    #[test]
    fn test_record_best_only_raises() {
        let mut session = Session::default();
        assert!(session.record_best(4));
        assert!(!session.record_best(2));
        assert!(!session.record_best(4));
        assert_eq!(session.best_score, 4);
    }
}
