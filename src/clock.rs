use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Source of "now" for everything that stamps or compares wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a settable instant. Used in tests.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        FixedClock { now: RwLock::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}
