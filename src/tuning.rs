//! Game balance tuning
//!
//! Every constant that shapes the difficulty curve lives here so hosts can
//! ship alternative balance files without touching the state machine.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("sweet spot [{start:.3}, {end:.3}] must be an ordered range inside [0, 1]")]
    SweetSpot { start: f64, end: f64 },
    #[error("base final size {final_size} exceeds base initial size {initial_size}")]
    ShrinkInverted { initial_size: f32, final_size: f32 },
}

/// Balance constants for the difficulty curve and challenge judgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Duration ===
    pub base_duration_ms: u64,
    pub duration_step_ms: u64,
    pub min_duration_ms: u64,

    // === Precision target ===
    pub base_initial_size: f32,
    pub initial_size_step: f32,
    pub min_initial_size: f32,
    pub base_final_size: f32,
    pub final_size_step: f32,
    pub min_final_size: f32,

    // === Judgment ===
    /// Window past the duration in which a precision tap still succeeds
    pub precision_grace_ms: u64,
    pub precision_timeout_grace_ms: u64,
    pub timing_timeout_grace_ms: u64,
    pub sweet_spot_start: f64,
    pub sweet_spot_end: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_duration_ms: BASE_DURATION_MS,
            duration_step_ms: DURATION_STEP_MS,
            min_duration_ms: MIN_DURATION_MS,

            base_initial_size: BASE_INITIAL_SIZE,
            initial_size_step: INITIAL_SIZE_STEP,
            min_initial_size: MIN_INITIAL_SIZE,
            base_final_size: BASE_FINAL_SIZE,
            final_size_step: FINAL_SIZE_STEP,
            min_final_size: MIN_FINAL_SIZE,

            precision_grace_ms: PRECISION_GRACE_MS,
            precision_timeout_grace_ms: PRECISION_TIMEOUT_GRACE_MS,
            timing_timeout_grace_ms: TIMING_TIMEOUT_GRACE_MS,
            sweet_spot_start: SWEET_SPOT_START,
            sweet_spot_end: SWEET_SPOT_END,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Pretty-printed JSON, suitable for shipping as a balance file
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject balance values that would break the difficulty curve or judge
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.min_duration_ms < 1 {
            return Err(TuningError::MinViolation {
                field: "min_duration_ms",
                min: 1.0,
                value: self.min_duration_ms as f64,
            });
        }
        let sizes = [
            ("min_initial_size", self.min_initial_size),
            ("min_final_size", self.min_final_size),
        ];
        for (field, value) in sizes {
            if value.is_nan() || value <= 0.0 {
                return Err(TuningError::MinViolation {
                    field,
                    min: f64::MIN_POSITIVE,
                    value: value as f64,
                });
            }
        }
        let (start, end) = (self.sweet_spot_start, self.sweet_spot_end);
        if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start > end {
            return Err(TuningError::SweetSpot { start, end });
        }
        if self.base_final_size > self.base_initial_size {
            return Err(TuningError::ShrinkInverted {
                initial_size: self.base_initial_size,
                final_size: self.base_final_size,
            });
        }
        Ok(())
    }

    /// Auto-fail grace past the duration for a challenge kind
    pub fn timeout_grace_ms(&self, kind: crate::sim::ChallengeKind) -> u64 {
        match kind {
            crate::sim::ChallengeKind::Precision => self.precision_timeout_grace_ms,
            crate::sim::ChallengeKind::Timing => self.timing_timeout_grace_ms,
        }
    }
}

/// Rectangle in presentation units where precision targets may be placed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeArea {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for SafeArea {
    fn default() -> Self {
        Self::from_size(DEFAULT_AREA_WIDTH, DEFAULT_AREA_HEIGHT)
    }
}

impl SafeArea {
    /// Build from two corners in any order
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Area anchored at the origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    /// Width and height
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Midpoint of the area
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// True if a square of side `size` centred at `center` lies fully inside
    pub fn contains_square(&self, center: Vec2, size: f32) -> bool {
        let half = Vec2::splat(size * 0.5);
        (center - half).cmpge(self.min).all() && (center + half).cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "sweet_spot_start": 0.4, "sweet_spot_end": 0.6 }"#)
            .unwrap();
        assert_eq!(tuning.sweet_spot_start, 0.4);
        assert_eq!(tuning.sweet_spot_end, 0.6);
        assert_eq!(tuning.base_duration_ms, BASE_DURATION_MS);
        assert_eq!(tuning.min_final_size, MIN_FINAL_SIZE);
    }

    #[test]
    fn test_inverted_sweet_spot_rejected() {
        let err = Tuning::from_json(r#"{ "sweet_spot_start": 0.7, "sweet_spot_end": 0.3 }"#)
            .unwrap_err();
        assert!(matches!(err, TuningError::SweetSpot { .. }));
    }

    #[test]
    fn test_zero_min_duration_rejected() {
        let tuning = Tuning {
            min_duration_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::MinViolation {
                field: "min_duration_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_non_positive_sizes_rejected() {
        for bad in [0.0, -5.0, f32::NAN] {
            let tuning = Tuning {
                min_final_size: bad,
                ..Default::default()
            };
            assert!(matches!(
                tuning.validate(),
                Err(TuningError::MinViolation {
                    field: "min_final_size",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_growing_target_rejected() {
        let tuning = Tuning {
            base_final_size: 300.0,
            ..Default::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::ShrinkInverted { .. })
        ));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let tuning = Tuning {
            base_duration_ms: 1500,
            ..Default::default()
        };
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_safe_area_orders_corners() {
        let area = SafeArea::new(Vec2::new(300.0, 50.0), Vec2::new(10.0, 400.0));
        assert_eq!(area.min, Vec2::new(10.0, 50.0));
        assert_eq!(area.max, Vec2::new(300.0, 400.0));
        assert!(area.contains_square(area.center(), 100.0));
        assert!(!area.contains_square(Vec2::new(20.0, 200.0), 100.0));
    }
}
