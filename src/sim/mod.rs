//! Game simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only from the injected clock
//! - Randomness only from the injected RNG
//! - Timers only through the injected scheduler
//! - No rendering or platform dependencies

pub mod difficulty;
pub mod engine;
pub mod judge;
pub mod state;

pub use difficulty::{challenge_duration_ms, compute_challenge_params, place_target, target_sizes};
pub use engine::{EventResult, GameEngine, Ignored};
pub use judge::{Verdict, in_sweet_spot, judge};
pub use state::{
    Action, ChallengeKind, ChallengeParams, FailureCause, GameEvent, GamePhase, PrecisionTarget,
    Session, Transition, progress,
};
