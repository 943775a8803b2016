//! Wall-clock time for report timestamps.

use chrono::{DateTime, SubsecRound, Utc};

use crate::ports::clock::Clock;

/// Reads the system clock, truncated to whole seconds.
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}
