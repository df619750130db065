//! Platform abstraction layer
//!
//! The engine never reads ambient time or spawns timers itself. Hosts inject:
//! - Time: a monotonic millisecond clock
//! - Timers: a cancellable one-shot scheduler for challenge timeouts

pub mod time;
pub mod timer;

pub use time::{Clock, ManualClock, SystemClock};
pub use timer::{ManualScheduler, Scheduler, ThreadScheduler, TimeoutToken};
