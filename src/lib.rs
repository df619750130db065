//! Stop or Double - a push-your-luck arcade game
//!
//! Core modules:
//! - `sim`: Game state machine, difficulty curve and challenge judgment
//! - `platform`: Injected clock and timeout scheduler
//! - `tuning`: Data-driven game balance
//! - `records`: Finished rounds for the current run

pub mod platform;
pub mod records;
pub mod sim;
pub mod tuning;

pub use records::{RoundOutcome, RoundRecord, RunRecords};
pub use sim::{
    ChallengeKind, ChallengeParams, GameEngine, GameEvent, GamePhase, Ignored, Session,
    Transition,
};
pub use tuning::{SafeArea, Tuning, TuningError};

/// Game balance defaults (overridable through [`Tuning`])
pub mod consts {
    /// Challenge duration at difficulty 0, shrinking by `DURATION_STEP_MS` per level
    pub const BASE_DURATION_MS: u64 = 2000;
    pub const DURATION_STEP_MS: u64 = 100;
    /// Shortest challenge the curve can produce
    pub const MIN_DURATION_MS: u64 = 1000;

    /// Precision target size when it appears
    pub const BASE_INITIAL_SIZE: f32 = 200.0;
    pub const INITIAL_SIZE_STEP: f32 = 15.0;
    pub const MIN_INITIAL_SIZE: f32 = 100.0;

    /// Precision target size once fully shrunk
    pub const BASE_FINAL_SIZE: f32 = 120.0;
    pub const FINAL_SIZE_STEP: f32 = 10.0;
    pub const MIN_FINAL_SIZE: f32 = 60.0;

    /// Late taps on a precision target still count within this window
    pub const PRECISION_GRACE_MS: u64 = 500;
    /// Auto-fail delay past the challenge duration
    pub const PRECISION_TIMEOUT_GRACE_MS: u64 = 500;
    pub const TIMING_TIMEOUT_GRACE_MS: u64 = 200;

    /// Timing challenge sweet spot (inclusive, progress fraction)
    pub const SWEET_SPOT_START: f64 = 0.35;
    pub const SWEET_SPOT_END: f64 = 0.65;

    /// Default safe placement area for precision targets (presentation units)
    pub const DEFAULT_AREA_WIDTH: f32 = 400.0;
    pub const DEFAULT_AREA_HEIGHT: f32 = 800.0;
}

/// Linear interpolation between `a` and `b` with `t` clamped to [0, 1]
#[inline]
pub fn lerp_clamped(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}
