//! Difficulty curve
//!
//! Pure functions mapping a difficulty level to challenge duration and
//! target geometry. Randomness comes only from the RNG passed in.

use glam::Vec2;
use rand::Rng;

use super::state::{ChallengeKind, ChallengeParams, PrecisionTarget};
use crate::tuning::{SafeArea, Tuning};

/// Shrink/progress duration for a difficulty level
pub fn challenge_duration_ms(tuning: &Tuning, difficulty: u32) -> u64 {
    let step = tuning.duration_step_ms.saturating_mul(difficulty as u64);
    tuning
        .base_duration_ms
        .saturating_sub(step)
        .max(tuning.min_duration_ms)
}

/// (initial, final) precision target size for a difficulty level
pub fn target_sizes(tuning: &Tuning, difficulty: u32) -> (f32, f32) {
    let d = difficulty as f32;
    let initial = (tuning.base_initial_size - d * tuning.initial_size_step)
        .max(tuning.min_initial_size);
    let final_size =
        (tuning.base_final_size - d * tuning.final_size_step).max(tuning.min_final_size);
    // Floors are tuned independently; never let the target grow
    (initial, final_size.min(initial))
}

/// Pick a centre so a square of side `size` stays fully inside `area`
///
/// Axes narrower than the target collapse to the area's centre line.
pub fn place_target<R: Rng + ?Sized>(area: &SafeArea, size: f32, rng: &mut R) -> Vec2 {
    let half = size * 0.5;
    let lo = area.min + Vec2::splat(half);
    let hi = area.max - Vec2::splat(half);
    let center = area.center();

    if lo.x > hi.x || lo.y > hi.y {
        log::warn!(
            "Safe area {:?} too small for target size {}, centring",
            area.size(),
            size
        );
    }

    let axis = |lo: f32, hi: f32, mid: f32, rng: &mut R| {
        if lo < hi {
            rng.random_range(lo..=hi)
        } else {
            mid
        }
    };
    let x = axis(lo.x, hi.x, center.x, rng);
    let y = axis(lo.y, hi.y, center.y, rng);
    Vec2::new(x, y)
}

/// Pick a challenge kind uniformly at random
pub fn pick_kind<R: Rng + ?Sized>(rng: &mut R) -> ChallengeKind {
    ChallengeKind::ALL[rng.random_range(0..ChallengeKind::ALL.len())]
}

/// Derive the full parameter set for a challenge starting at `now_ms`
pub fn compute_challenge_params<R: Rng + ?Sized>(
    kind: ChallengeKind,
    difficulty: u32,
    tuning: &Tuning,
    area: &SafeArea,
    now_ms: u64,
    rng: &mut R,
) -> ChallengeParams {
    let duration_ms = challenge_duration_ms(tuning, difficulty);
    let timeout_ms = duration_ms.saturating_add(tuning.timeout_grace_ms(kind));

    let target = match kind {
        ChallengeKind::Precision => {
            let (initial_size, final_size) = target_sizes(tuning, difficulty);
            Some(PrecisionTarget {
                center: place_target(area, initial_size, rng),
                initial_size,
                final_size,
            })
        }
        ChallengeKind::Timing => None,
    };

    ChallengeParams {
        kind,
        difficulty,
        started_at_ms: now_ms,
        duration_ms,
        timeout_ms,
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_duration_curve() {
        let tuning = Tuning::default();
        assert_eq!(challenge_duration_ms(&tuning, 1), 1900);
        assert_eq!(challenge_duration_ms(&tuning, 5), 1500);
        assert_eq!(challenge_duration_ms(&tuning, 10), 1000);
        assert_eq!(challenge_duration_ms(&tuning, 50), 1000);
        assert_eq!(challenge_duration_ms(&tuning, u32::MAX), 1000);
    }

    #[test]
    fn test_size_curve() {
        let tuning = Tuning::default();
        assert_eq!(target_sizes(&tuning, 1), (185.0, 110.0));
        assert_eq!(target_sizes(&tuning, 4), (140.0, 80.0));
        assert_eq!(target_sizes(&tuning, 7), (100.0, 60.0));
        assert_eq!(target_sizes(&tuning, 40), (100.0, 60.0));
    }

    #[test]
    fn test_timeout_grace_per_kind() {
        let tuning = Tuning::default();
        let area = SafeArea::default();
        let mut rng = Pcg32::seed_from_u64(1);

        let precision =
            compute_challenge_params(ChallengeKind::Precision, 1, &tuning, &area, 0, &mut rng);
        assert_eq!(precision.timeout_ms, 1900 + 500);
        assert!(precision.target.is_some());

        let timing =
            compute_challenge_params(ChallengeKind::Timing, 1, &tuning, &area, 0, &mut rng);
        assert_eq!(timing.timeout_ms, 1900 + 200);
        assert!(timing.target.is_none());
    }

    #[test]
    fn test_same_seed_same_params() {
        let tuning = Tuning::default();
        let area = SafeArea::default();
        let mut a = Pcg32::seed_from_u64(42);
        let mut b = Pcg32::seed_from_u64(42);
        let kind = ChallengeKind::Precision;
        for difficulty in 1..20 {
            let pa = compute_challenge_params(kind, difficulty, &tuning, &area, 7, &mut a);
            let pb = compute_challenge_params(kind, difficulty, &tuning, &area, 7, &mut b);
            assert_eq!(pa, pb);
        }
    }

    #[test]
    fn test_tiny_area_centres_target() {
        let area = SafeArea::from_size(50.0, 1000.0);
        let mut rng = Pcg32::seed_from_u64(3);
        let center = place_target(&area, 185.0, &mut rng);
        assert_eq!(center.x, 25.0);
        assert!((92.5..=907.5).contains(&center.y));
    }

    #[test]
    fn test_pick_kind_sees_both() {
        let mut rng = Pcg32::seed_from_u64(9);
        let kinds: Vec<_> = (0..64).map(|_| pick_kind(&mut rng)).collect();
        assert!(kinds.contains(&ChallengeKind::Precision));
        assert!(kinds.contains(&ChallengeKind::Timing));
    }

    proptest! {
        #[test]
        fn full_size_target_never_clips(
            seed in any::<u64>(),
            difficulty in 1u32..40,
            x in -500i32..500,
            y in -500i32..500,
            w in 200i32..2000,
            h in 200i32..2000,
        ) {
            let tuning = Tuning::default();
            let (x, y) = (x as f32, y as f32);
            let area = SafeArea::new(Vec2::new(x, y), Vec2::new(x + w as f32, y + h as f32));
            let mut rng = Pcg32::seed_from_u64(seed);
            let kind = ChallengeKind::Precision;
            let params = compute_challenge_params(kind, difficulty, &tuning, &area, 0, &mut rng);
            let target = params.target.unwrap();
            prop_assert!(area.contains_square(target.center, target.initial_size));
            prop_assert!(target.final_size <= target.initial_size);
        }

        #[test]
        fn duration_never_increases_with_difficulty(d in 1u32..1000) {
            let tuning = Tuning::default();
            let now = challenge_duration_ms(&tuning, d);
            let next = challenge_duration_ms(&tuning, d + 1);
            prop_assert!(next <= now);
            prop_assert!(next >= tuning.min_duration_ms);
        }
    }
}
