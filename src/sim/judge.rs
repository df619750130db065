//! Challenge judgment
//!
//! Only timing is judged here. Whether a precision tap actually landed on
//! the target is decided by the presentation layer, which forwards on-target
//! taps only.

use serde::{Deserialize, Serialize};

use super::state::{ChallengeKind, progress};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Success,
    Failure,
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }
}

/// Judge an attempt made `elapsed_ms` after a challenge of `duration_ms` started
pub fn judge(kind: ChallengeKind, elapsed_ms: u64, duration_ms: u64, tuning: &Tuning) -> Verdict {
    let success = match kind {
        ChallengeKind::Precision => {
            elapsed_ms < duration_ms.saturating_add(tuning.precision_grace_ms)
        }
        ChallengeKind::Timing => in_sweet_spot(progress(elapsed_ms, duration_ms), tuning),
    };

    if success {
        Verdict::Success
    } else {
        Verdict::Failure
    }
}

/// Inclusive sweet-spot check on a progress fraction
pub fn in_sweet_spot(progress: f64, tuning: &Tuning) -> bool {
    (tuning.sweet_spot_start..=tuning.sweet_spot_end).contains(&progress)
}
