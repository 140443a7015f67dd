//! `ClockProvider` — the one collaborator interface from §6 that almost every
//! service takes, so that `issuedAtUtc`/`voidedAtUtc`/`paidAtUtc`/`appliedAtUtc`
//! and the `YYYYMM` embedded in document numbers are deterministic in tests.

use chrono::{DateTime, Utc};

/// Supplies the current time. Implemented by `SystemClock` in production and
/// `FixedClock` in tests — no service anywhere calls `Utc::now()` directly.
pub trait ClockProvider: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockProvider for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl ClockProvider for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_is_stable() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let clock = FixedClock(t);
        assert_eq!(clock.now_utc(), t);
        assert_eq!(clock.now_utc(), t);
    }
}
