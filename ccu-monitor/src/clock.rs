//! Wall-clock access and minute-boundary scheduling
//!
//! Sampling is aligned to whole wall-clock minutes. Every wait recomputes the
//! next boundary from the *current* time, so a slow tick never accumulates
//! drift but can land past the following boundary (that tick is compressed).

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Display format for sample timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of wall-clock time with a matching suspension primitive
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Suspend until `deadline`; returns immediately if it already passed.
    async fn sleep_until(&self, deadline: DateTime<Local>);
}

/// Next whole-minute boundary strictly after `now`
pub fn next_minute_boundary(now: DateTime<Local>) -> DateTime<Local> {
    let next = (now.timestamp().div_euclid(60) + 1) * 60;
    DateTime::from_timestamp(next, 0)
        .map(|utc| utc.with_timezone(&Local))
        .unwrap_or_else(|| now + TimeDelta::minutes(1))
}

pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Real local wall clock backed by tokio timers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    async fn sleep_until(&self, deadline: DateTime<Local>) {
        match (deadline - Local::now()).to_std() {
            Ok(remaining) => {
                debug!("Sleeping {:?} until {}", remaining, format_timestamp(deadline));
                tokio::time::sleep(remaining).await;
            }
            // Deadline already behind us: overrun tick
            Err(_) => debug!("Boundary {} already passed", format_timestamp(deadline)),
        }
    }
}

/// Deterministic clock anchored at a fixed start time.
///
/// Time flows with tokio's clock, so under `start_paused` tests every sleep
/// completes as soon as the runtime is idle. Each task sleeps on its own
/// timer: two samplers sharing one `ManualClock` both wake on every boundary,
/// exactly as they would on the system clock. Clones share the same timeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: DateTime<Local>,
    anchor: tokio::time::Instant,
    /// Manual jumps on top of elapsed tokio time
    offset: Arc<Mutex<TimeDelta>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            start,
            anchor: tokio::time::Instant::now(),
            offset: Arc::new(Mutex::new(TimeDelta::zero())),
        }
    }

    /// Jump every clone forward without waiting
    pub fn advance(&self, by: TimeDelta) {
        *self.offset.lock() += by;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        let elapsed = TimeDelta::from_std(self.anchor.elapsed()).unwrap_or_else(|_| TimeDelta::zero());
        self.start + elapsed + *self.offset.lock()
    }

    async fn sleep_until(&self, deadline: DateTime<Local>) {
        // A jump from `advance` may land us past the deadline mid-sleep
        while let Ok(remaining) = (deadline - self.now()).to_std() {
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(remaining).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 17, h, m, s).unwrap()
    }

    #[test]
    fn test_boundary_rounds_up_to_next_minute() {
        let next = next_minute_boundary(at(12, 0, 37));
        assert_eq!(next, at(12, 1, 0));
    }

    #[test]
    fn test_boundary_on_exact_minute_moves_forward() {
        // Already on a boundary: the *next* one is a full minute away
        let next = next_minute_boundary(at(12, 5, 0));
        assert_eq!(next, at(12, 6, 0));
    }

    #[test]
    fn test_boundary_drops_subsecond_part() {
        let now = at(23, 59, 59) + TimeDelta::milliseconds(999);
        let next = next_minute_boundary(now);
        assert_eq!(next.second(), 0);
        assert_eq!(next.nanosecond(), 0);
        assert_eq!(next - now, TimeDelta::milliseconds(1));
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(format_timestamp(at(9, 4, 3)), "2024-05-17 09:04:03");
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_clock_follows_tokio_time() {
        let clock = ManualClock::new(at(10, 0, 30));

        clock.sleep_until(at(10, 1, 0)).await;
        assert_eq!(clock.now(), at(10, 1, 0));

        // A deadline in the past returns at once
        clock.sleep_until(at(9, 0, 0)).await;
        assert_eq!(clock.now(), at(10, 1, 0));

        clock.advance(TimeDelta::seconds(15));
        assert_eq!(clock.now(), at(10, 1, 15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_clock_tasks_sleep_independently() {
        let clock = ManualClock::new(at(10, 0, 30));
        let other = clock.clone();

        let waiter = tokio::spawn(async move {
            other.sleep_until(at(10, 1, 0)).await;
            other.now()
        });
        clock.sleep_until(at(10, 1, 0)).await;

        // Both wake on the same boundary, neither pushes the other past it
        assert_eq!(waiter.await.unwrap(), at(10, 1, 0));
        assert_eq!(clock.now(), at(10, 1, 0));
    }

    #[tokio::test]
    async fn test_system_clock_past_deadline_returns() {
        let clock = SystemClock;
        let past = clock.now() - TimeDelta::seconds(5);
        tokio::time::timeout(std::time::Duration::from_secs(1), clock.sleep_until(past))
            .await
            .expect("past deadline must not block");
    }
}
