//! Wall clock abstraction.
//!
//! RULE: Lifecycle code never calls `Utc::now()` directly.
//! Overdue checks are a function of (record, now), so the clock is
//! injected and tests drive it by hand.

use crate::types::Timestamp;
use chrono::{Duration, Utc};
use std::cell::Cell;
use std::rc::Rc;

pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock that only moves when told to.
/// Clones share the same instant, so a test can keep a handle
/// after giving one to the lifecycle manager.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Rc<Cell<Timestamp>>,
}

impl ManualClock {
    pub fn starting_at(at: Timestamp) -> Self {
        Self {
            current: Rc::new(Cell::new(at)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.current.set(self.current.get() + by);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.current.get()
    }
}
