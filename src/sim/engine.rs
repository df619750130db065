//! Game engine
//!
//! Owns the [`Session`] and is the only thing allowed to mutate it. Every
//! change goes through one of the player operations or [`GameEngine::handle_timeout`],
//! and every applied change is broadcast as a [`Transition`].

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use super::difficulty::{compute_challenge_params, pick_kind};
use super::judge::{Verdict, judge};
use super::state::{
    Action, ChallengeParams, FailureCause, GameEvent, GamePhase, Session, Transition,
};
use crate::platform::{Clock, Scheduler, TimeoutToken};
use crate::records::{RoundOutcome, RunRecords};
use crate::tuning::{SafeArea, Tuning};

/// An event that was received but changed nothing
///
/// Returned instead of panicking so UI races (double taps, taps racing the
/// timeout) are harmless. Callers are free to drop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Ignored {
    #[error("{action:?} is not valid while {phase:?}")]
    InvalidTransition { action: Action, phase: GamePhase },
    #[error("timeout {token:?} is stale (pending: {pending:?})")]
    StaleTimeout {
        token: TimeoutToken,
        pending: Option<TimeoutToken>,
    },
}

pub type EventResult = Result<Transition, Ignored>;

type Observer = Box<dyn FnMut(&Transition)>;

/// The stop-or-double state machine
pub struct GameEngine {
    session: Session,
    tuning: Tuning,
    area: SafeArea,
    clock: Box<dyn Clock>,
    scheduler: Box<dyn Scheduler>,
    rng: Box<dyn RngCore>,
    /// Bumped for every challenge; identifies its timeout
    generation: u64,
    /// Timeout of the running challenge, if any
    pending: Option<TimeoutToken>,
    /// Best score when the current round began; a bank above it is a new best
    round_start_best: u64,
    records: RunRecords,
    observers: Vec<Observer>,
}

impl GameEngine {
    /// Create an idle engine with default tuning and safe area
    pub fn new(
        clock: impl Clock + 'static,
        scheduler: impl Scheduler + 'static,
        rng: impl RngCore + 'static,
    ) -> Self {
        Self {
            session: Session::default(),
            tuning: Tuning::default(),
            area: SafeArea::default(),
            clock: Box::new(clock),
            scheduler: Box::new(scheduler),
            rng: Box::new(rng),
            generation: 0,
            pending: None,
            round_start_best: 0,
            records: RunRecords::new(),
            observers: Vec::new(),
        }
    }

    /// Create an engine whose randomness is fully determined by `seed`
    pub fn seeded(
        seed: u64,
        clock: impl Clock + 'static,
        scheduler: impl Scheduler + 'static,
    ) -> Self {
        Self::new(clock, scheduler, Pcg32::seed_from_u64(seed))
    }

    /// Replace the default balance constants
    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Area in which precision targets are placed
    pub fn with_safe_area(mut self, area: SafeArea) -> Self {
        self.area = area;
        self
    }

    /// Seed the best score from external storage (never lowers it)
    pub fn with_best_score(mut self, best_score: u64) -> Self {
        self.session.record_best(best_score);
        self
    }

    /// Subscribe to every applied transition
    pub fn on_transition(&mut self, observer: impl FnMut(&Transition) + 'static) {
        self.observers.push(Box::new(observer));
    }

    // === Accessors ===

    /// Snapshot-ready view of the whole session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current phase of the state machine
    pub fn phase(&self) -> GamePhase {
        self.session.phase
    }

    /// Score at stake (or banked, once the round is over)
    pub fn score(&self) -> u64 {
        self.session.score
    }

    /// Highest score reached by this engine, for external storage
    pub fn best_score(&self) -> u64 {
        self.session.best_score
    }

    /// Difficulty the next challenge is computed for (1 at round start)
    pub fn difficulty(&self) -> u32 {
        self.session.difficulty
    }

    /// The running challenge (only while `InChallenge`)
    pub fn challenge(&self) -> Option<&ChallengeParams> {
        self.session.challenge.as_ref()
    }

    /// Time since the running challenge started, as the engine measures it
    pub fn challenge_elapsed_ms(&self) -> Option<u64> {
        let now = self.clock.now_ms();
        self.challenge().map(|c| c.elapsed_ms(now))
    }

    /// Token of the timeout the engine is waiting on, if a challenge runs
    pub fn pending_timeout(&self) -> Option<TimeoutToken> {
        self.pending
    }

    /// Finished rounds of this run, best first
    pub fn records(&self) -> &RunRecords {
        &self.records
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Area precision targets are kept inside
    pub fn safe_area(&self) -> &SafeArea {
        &self.area
    }

    // === Player operations ===

    /// Begin a round at score 1, difficulty 1 (from `Idle` or `GameOver`)
    pub fn start_game(&mut self) -> EventResult {
        let from = self.session.phase;
        if !matches!(from, GamePhase::Idle | GamePhase::GameOver) {
            return self.ignore(Action::StartGame);
        }

        self.cancel_pending();
        self.session.score = 1;
        self.session.difficulty = 1;
        self.session.challenge = None;
        self.session.phase = GamePhase::Choosing;
        self.round_start_best = self.session.best_score;

        log::info!("Game started (best score {})", self.session.best_score);
        Ok(self.emit(from, GameEvent::ScoreChanged { score: 1 }))
    }

    /// Bank the current score and end the round
    pub fn stop(&mut self) -> EventResult {
        let from = self.session.phase;
        if from != GamePhase::Choosing {
            return self.ignore(Action::Stop);
        }

        let score = self.session.score;
        self.session.record_best(score);
        // Successful doubles already raised best_score, so compare against the round's start
        let new_best = score > self.round_start_best;
        self.session.phase = GamePhase::GameOver;
        self.record_round(score, RoundOutcome::Banked);

        log::info!("Banked {} (best {})", score, self.session.best_score);
        Ok(self.emit(from, GameEvent::RoundBanked { score, new_best }))
    }

    /// Risk the current score on a random challenge
    pub fn double(&mut self) -> EventResult {
        let from = self.session.phase;
        if from != GamePhase::Choosing {
            return self.ignore(Action::Double);
        }

        self.cancel_pending();

        let now = self.clock.now_ms();
        let kind = pick_kind(&mut *self.rng);
        let params = compute_challenge_params(
            kind,
            self.session.difficulty,
            &self.tuning,
            &self.area,
            now,
            &mut *self.rng,
        );

        self.generation += 1;
        let token = TimeoutToken::new(self.generation);
        self.scheduler.schedule(token, params.timeout_ms);
        self.pending = Some(token);

        log::info!(
            "{} challenge started at difficulty {} ({}ms, auto-fail at {}ms)",
            kind.as_str(),
            params.difficulty,
            params.duration_ms,
            params.timeout_ms
        );
        if let Some(target) = &params.target {
            log::debug!(
                "Target at {:?}, size {} -> {}",
                target.center,
                target.initial_size,
                target.final_size
            );
        }

        self.session.challenge = Some(params.clone());
        self.session.phase = GamePhase::InChallenge;
        Ok(self.emit(from, GameEvent::ChallengeStarted { challenge: params }))
    }

    /// Resolve the running challenge with a player attempt
    ///
    /// Elapsed time is read from the engine clock at the moment of the call.
    pub fn attempt(&mut self) -> EventResult {
        let from = self.session.phase;
        if from != GamePhase::InChallenge || self.pending.is_none() {
            return self.ignore(Action::Attempt);
        }
        let Some(challenge) = self.session.challenge.take() else {
            return self.ignore(Action::Attempt);
        };

        self.cancel_pending();

        let now = self.clock.now_ms();
        if now < challenge.started_at_ms {
            log::warn!(
                "Clock went backwards ({} < {}), treating elapsed as 0",
                now,
                challenge.started_at_ms
            );
        }
        let elapsed_ms = challenge.elapsed_ms(now);
        let verdict = judge(
            challenge.kind,
            elapsed_ms,
            challenge.duration_ms,
            &self.tuning,
        );
        log::debug!(
            "{} attempt at {}ms of {}ms (progress {:.3}): {:?}",
            challenge.kind.as_str(),
            elapsed_ms,
            challenge.duration_ms,
            challenge.progress_at(elapsed_ms),
            verdict
        );

        match verdict {
            Verdict::Success => Ok(self.succeed(from, &challenge, elapsed_ms)),
            Verdict::Failure => {
                Ok(self.fail(from, &challenge, FailureCause::Missed, Some(elapsed_ms)))
            }
        }
    }

    /// Deliver a fired timeout; anything but the current pending token is stale
    pub fn handle_timeout(&mut self, token: TimeoutToken) -> EventResult {
        let from = self.session.phase;
        if self.pending != Some(token) || from != GamePhase::InChallenge {
            log::debug!("Ignoring stale timeout {:?}", token);
            return Err(Ignored::StaleTimeout {
                token,
                pending: self.pending,
            });
        }
        let Some(challenge) = self.session.challenge.take() else {
            return self.ignore(Action::Timeout);
        };

        self.cancel_pending();
        log::info!("{} challenge timed out", challenge.kind.as_str());
        Ok(self.fail(from, &challenge, FailureCause::TimedOut, None))
    }

    /// Fire the pending timeout if the clock has passed its deadline
    ///
    /// For hosts that drive the engine from a frame loop instead of a
    /// real-time scheduler.
    pub fn poll(&mut self) -> Option<Transition> {
        let token = self.pending?;
        let deadline = self.challenge()?.deadline_ms();
        if self.clock.now_ms() < deadline {
            return None;
        }
        self.handle_timeout(token).ok()
    }

    // === Internals ===

    fn succeed(
        &mut self,
        from: GamePhase,
        challenge: &ChallengeParams,
        elapsed_ms: u64,
    ) -> Transition {
        let session = &mut self.session;
        session.score = session.score.saturating_mul(2);
        session.difficulty = session.difficulty.saturating_add(1);
        let score = session.score;
        session.record_best(score);
        session.phase = GamePhase::Choosing;

        log::info!(
            "{} challenge passed: score {}, difficulty {}",
            challenge.kind.as_str(),
            score,
            session.difficulty
        );
        let event = GameEvent::ChallengeSucceeded {
            kind: challenge.kind,
            elapsed_ms,
            score,
            difficulty: session.difficulty,
        };
        self.emit(from, event)
    }

    fn fail(
        &mut self,
        from: GamePhase,
        challenge: &ChallengeParams,
        cause: FailureCause,
        elapsed_ms: Option<u64>,
    ) -> Transition {
        let lost_score = self.session.score;
        self.session.record_best(lost_score);
        self.record_round(lost_score, RoundOutcome::Lost);
        self.session.score = 0;
        self.session.phase = GamePhase::GameOver;

        log::info!(
            "{} challenge failed ({:?}), lost {}",
            challenge.kind.as_str(),
            cause,
            lost_score
        );
        let event = GameEvent::ChallengeFailed {
            kind: challenge.kind,
            cause,
            lost_score,
            elapsed_ms,
        };
        self.emit(from, event)
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel(token);
        }
    }

    fn record_round(&mut self, score: u64, outcome: RoundOutcome) {
        let now = self.clock.now_ms();
        if let Some(rank) = self
            .records
            .add_round(score, outcome, self.session.difficulty, now)
        {
            log::debug!("Round recorded at rank {}", rank);
        }
    }

    fn ignore(&self, action: Action) -> EventResult {
        log::debug!("Ignoring {:?} while {:?}", action, self.session.phase);
        Err(Ignored::InvalidTransition {
            action,
            phase: self.session.phase,
        })
    }

    fn emit(&mut self, from: GamePhase, event: GameEvent) -> Transition {
        let transition = Transition {
            from,
            to: self.session.phase,
            event,
            session: self.session.clone(),
        };
        for observer in self.observers.iter_mut() {
            observer(&transition);
        }
        transition
    }
}
