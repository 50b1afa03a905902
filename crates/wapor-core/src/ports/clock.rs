use chrono::{DateTime, Utc};
use std::time::Duration;

/// Port for reading the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Port for blocking the caller between job polls
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Blocks the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
