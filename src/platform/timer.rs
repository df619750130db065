//! Cancellable one-shot timers for challenge timeouts
//!
//! A scheduler never touches engine state. When a timer fires, the host hands
//! its [`TimeoutToken`] back to `GameEngine::handle_timeout`, which compares
//! it against the challenge currently pending and drops it if stale.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::time::{Clock, ManualClock};

/// Identifies one challenge's timeout (its generation number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeoutToken(u64);

impl TimeoutToken {
    pub fn new(generation: u64) -> Self {
        Self(generation)
    }

    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// One-shot timer service
pub trait Scheduler {
    /// Arrange for `token` to be delivered back to the engine after `delay_ms`
    fn schedule(&mut self, token: TimeoutToken, delay_ms: u64);
    /// Best-effort cancellation; a token that already fired is ignored
    fn cancel(&mut self, token: TimeoutToken);
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    token: TimeoutToken,
    deadline_ms: u64,
}

/// Scheduler driven by a [`ManualClock`]
///
/// Nothing fires on its own: the owner calls [`ManualScheduler::take_due`]
/// and forwards each token to the engine. Clones share the same queue.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    pending: Rc<RefCell<Vec<PendingTimer>>>,
}

impl ManualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            pending: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Number of timers scheduled and not yet fired or cancelled
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn deadline(&self, token: TimeoutToken) -> Option<u64> {
        self.pending
            .borrow()
            .iter()
            .find(|t| t.token == token)
            .map(|t| t.deadline_ms)
    }

    /// Remove and return every timer whose deadline has passed, earliest first
    pub fn take_due(&self) -> Vec<TimeoutToken> {
        let now = self.clock.now_ms();
        let mut pending = self.pending.borrow_mut();
        let mut due: Vec<PendingTimer> = pending
            .iter()
            .filter(|t| t.deadline_ms <= now)
            .copied()
            .collect();
        pending.retain(|t| t.deadline_ms > now);
        due.sort_by_key(|t| (t.deadline_ms, t.token));
        due.into_iter().map(|t| t.token).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, token: TimeoutToken, delay_ms: u64) {
        let deadline_ms = self.clock.now_ms().saturating_add(delay_ms);
        self.pending
            .borrow_mut()
            .push(PendingTimer { token, deadline_ms });
    }

    fn cancel(&mut self, token: TimeoutToken) {
        self.pending.borrow_mut().retain(|t| t.token != token);
    }
}

type Notify = Arc<dyn Fn(TimeoutToken) + Send + Sync>;

/// Real-time scheduler: one sleeping thread per timer
///
/// Fired tokens are passed to the `notify` callback on the timer thread,
/// typically a channel send into the host's event loop.
pub struct ThreadScheduler {
    notify: Notify,
    pending: HashMap<TimeoutToken, Arc<AtomicBool>>,
}

impl ThreadScheduler {
    pub fn new(notify: impl Fn(TimeoutToken) + Send + Sync + 'static) -> Self {
        Self {
            notify: Arc::new(notify),
            pending: HashMap::new(),
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&mut self, token: TimeoutToken, delay_ms: u64) {
        let cancelled = Arc::new(AtomicBool::new(false));
        if let Some(previous) = self.pending.insert(token, cancelled.clone()) {
            previous.store(true, Ordering::SeqCst);
        }

        let notify = self.notify.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(delay_ms));
            if !cancelled.load(Ordering::SeqCst) {
                notify(token);
            }
        });
    }

    fn cancel(&mut self, token: TimeoutToken) {
        if let Some(flag) = self.pending.remove(&token) {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        for flag in self.pending.values() {
            flag.store(true, Ordering::SeqCst);
        }
    }
}
