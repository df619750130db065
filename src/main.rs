//! Stop or Double entry point
//!
//! Plays the game in a terminal. Stdin lines and fired timeouts arrive on one
//! channel, so the engine only ever runs on the main thread.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

use stop_or_double::consts::{DEFAULT_AREA_HEIGHT, DEFAULT_AREA_WIDTH};
use stop_or_double::platform::{SystemClock, ThreadScheduler, TimeoutToken};
use stop_or_double::sim::{
    ChallengeKind, FailureCause, GameEngine, GameEvent, GamePhase, Transition,
};
use stop_or_double::{SafeArea, Tuning};

#[derive(Parser, Debug)]
#[command(name = "stop-or-double", version, about = "Bank your score or double it")]
struct Args {
    /// RNG seed (defaults to the current time)
    #[arg(long)]
    seed: Option<u64>,
    /// JSON balance file; missing fields keep their defaults
    #[arg(long, value_name = "FILE")]
    tuning: Option<PathBuf>,
    /// Best score restored from a previous run
    #[arg(long, default_value_t = 0)]
    best: u64,
    /// Width of the precision target area
    #[arg(long, default_value_t = DEFAULT_AREA_WIDTH)]
    width: f32,
    /// Height of the precision target area
    #[arg(long, default_value_t = DEFAULT_AREA_HEIGHT)]
    height: f32,
}

/// Everything the main loop reacts to
enum Input {
    Line(String),
    Timeout(TimeoutToken),
    Closed,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => match Tuning::load(path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Invalid tuning file {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };
    let seed = args.seed.unwrap_or_else(seed_from_time);
    log::info!("Stop or Double starting with seed {}", seed);

    let (tx, rx) = mpsc::channel();
    spawn_stdin_reader(tx.clone());
    let scheduler = ThreadScheduler::new(move |token| {
        let _ = tx.send(Input::Timeout(token));
    });

    let mut engine = GameEngine::seeded(seed, SystemClock::new(), scheduler)
        .with_tuning(tuning.clone())
        .with_safe_area(SafeArea::from_size(args.width, args.height))
        .with_best_score(args.best);
    engine.on_transition(move |t| render_transition(t, &tuning));

    println!("STOP OR DOUBLE");
    print_prompt(&engine);
    while let Ok(input) = rx.recv() {
        let applied = match input {
            Input::Timeout(token) => engine.handle_timeout(token).is_ok(),
            Input::Line(line) => match line.trim() {
                "q" | "quit" => break,
                cmd => handle_command(&mut engine, cmd),
            },
            Input::Closed => break,
        };
        if applied {
            print_prompt(&engine);
        }
    }

    println!("Best score this run: {}", engine.best_score());
}

fn seed_from_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn spawn_stdin_reader(tx: Sender<Input>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Input::Closed);
    });
}

/// Map a typed command onto an engine operation; returns true if it applied
fn handle_command(engine: &mut GameEngine, cmd: &str) -> bool {
    let result = match (engine.phase(), cmd) {
        // Restart must be typed; a late tap after a timeout lands here as ""
        (GamePhase::Idle | GamePhase::GameOver, "s" | "start") => engine.start_game(),
        (GamePhase::Choosing, "s" | "stop") => engine.stop(),
        (GamePhase::Choosing, "d" | "double") => engine.double(),
        // Any line counts as a tap while a challenge runs
        (GamePhase::InChallenge, _) => {
            log_tap(engine);
            engine.attempt()
        }
        _ => {
            print_prompt(engine);
            return false;
        }
    };
    match result {
        Ok(_) => true,
        Err(e) => {
            log::debug!("{}", e);
            false
        }
    }
}

/// Where the tap landed on the engine's own clock
fn log_tap(engine: &GameEngine) {
    let (Some(challenge), Some(elapsed)) = (engine.challenge(), engine.challenge_elapsed_ms())
    else {
        return;
    };
    match challenge.target_size_at(elapsed) {
        Some(size) => log::debug!("Tap at {}ms, target size {:.0}", elapsed, size),
        None => log::debug!("Tap at {}ms, bar at {:.2}", elapsed, challenge.progress_at(elapsed)),
    }
}

fn print_prompt(engine: &GameEngine) {
    match engine.phase() {
        GamePhase::Idle => println!(
            "Best score: {}. Type s to start, q to quit.",
            engine.best_score()
        ),
        GamePhase::Choosing => print!("Score {}. [s]top or [d]ouble? ", engine.score()),
        GamePhase::InChallenge => print!("> "),
        GamePhase::GameOver => println!("Type s to play again, q to quit."),
    }
    let _ = io::stdout().flush();
}

/// Presentation feedback for each transition
fn render_transition(transition: &Transition, tuning: &Tuning) {
    match &transition.event {
        GameEvent::ScoreChanged { score } => println!("\nNew round. Score: {}", score),
        GameEvent::RoundBanked { score, new_best } => {
            println!("\nBanked {}{}", score, if *new_best { " - NEW BEST!" } else { "" });
            println!("GAME OVER. Final score {}, best {}", score, transition.session.best_score);
        }
        GameEvent::ChallengeStarted { challenge } => match challenge.kind {
            ChallengeKind::Timing => {
                let duration = challenge.duration_ms as f64;
                println!(
                    "\nTIMING! The bar fills in {}ms. Press Enter between {:.0}ms and {:.0}ms.",
                    challenge.duration_ms,
                    duration * tuning.sweet_spot_start,
                    duration * tuning.sweet_spot_end
                );
            }
            ChallengeKind::Precision => {
                if let Some(target) = &challenge.target {
                    println!(
                        "\nPRECISION! Target at ({:.0}, {:.0}) shrinking {:.0} -> {:.0}.",
                        target.center.x,
                        target.center.y,
                        target.initial_size,
                        target.final_size,
                    );
                    println!(
                        "Tap (Enter) within {}ms!",
                        challenge.duration_ms + tuning.precision_grace_ms
                    );
                }
            }
        },
        GameEvent::ChallengeSucceeded {
            elapsed_ms, score, ..
        } => println!("\nSUCCESS at {}ms! Score doubled to {}", elapsed_ms, score),
        GameEvent::ChallengeFailed {
            cause, lost_score, elapsed_ms, ..
        } => {
            match (cause, elapsed_ms) {
                (FailureCause::Missed, Some(ms)) => println!("\nMISSED at {}ms.", ms),
                _ => println!("\nTOO SLOW!"),
            }
            println!(
                "GAME OVER. Lost {}. Best score {}",
                lost_score, transition.session.best_score
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stop_or_double::platform::{ManualClock, ManualScheduler};

    fn timed_out_engine() -> GameEngine {
        let clock = ManualClock::new(0);
        let scheduler = ManualScheduler::new(clock.clone());
        let mut engine = GameEngine::seeded(7, clock.clone(), scheduler.clone());
        engine.start_game().unwrap();
        engine.double().unwrap();
        clock.advance(10_000);
        for token in scheduler.take_due() {
            engine.handle_timeout(token).unwrap();
        }
        assert_eq!(engine.phase(), GamePhase::GameOver);
        engine
    }

    #[test]
    fn test_late_tap_after_timeout_does_not_restart() {
        let mut engine = timed_out_engine();
        assert!(!handle_command(&mut engine, ""));
        assert_eq!(engine.phase(), GamePhase::GameOver);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn test_typed_start_restarts() {
        let mut engine = timed_out_engine();
        assert!(handle_command(&mut engine, "s"));
        assert_eq!(engine.phase(), GamePhase::Choosing);
        assert_eq!(engine.score(), 1);
    }

    #[test]
    fn test_blank_line_in_challenge_is_a_tap() {
        let clock = ManualClock::new(0);
        let scheduler = ManualScheduler::new(clock.clone());
        let mut engine = GameEngine::seeded(7, clock.clone(), scheduler);
        assert!(handle_command(&mut engine, "start"));
        assert!(handle_command(&mut engine, "d"));
        clock.advance(100);
        assert!(handle_command(&mut engine, ""));
        assert_ne!(engine.phase(), GamePhase::InChallenge);
    }
}
