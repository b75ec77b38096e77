//! Trigger abstraction for the rate limiter's reset schedule.
//!
//! A trigger is a black box that, given the context of prior firings,
//! returns the next firing instant or `None` to end the schedule. The rate
//! limiter threads the last scheduled instant through successive calls.
//! Fixed-delay and fixed-rate triggers are provided; cron-style triggers
//! plug in through the same trait.

use std::time::{Duration, Instant};

/// Prior-firing context handed to [`Trigger::next_execution`].
#[derive(Clone, Copy, Debug)]
pub struct TriggerContext {
    /// The current instant, per the caller's clock.
    pub now: Instant,
    /// The instant the previous firing was scheduled for, or `None` before
    /// the first firing.
    pub last_scheduled: Option<Instant>,
    /// The instant the previous firing actually ran, or `None` before the
    /// first firing.
    pub last_completion: Option<Instant>,
}

impl TriggerContext {
    /// A context with no previous execution.
    pub fn initial(now: Instant) -> TriggerContext {
        TriggerContext {
            now,
            last_scheduled: None,
            last_completion: None,
        }
    }
}

/// A schedule of firing instants.
pub trait Trigger: Send + Sync {
    /// The next firing instant, or `None` to end the schedule.
    fn next_execution(&self, context: &TriggerContext) -> Option<Instant>;
}

/// Fires a fixed delay after the previous firing completed.
#[derive(Clone, Copy, Debug)]
pub struct FixedDelayTrigger {
    delay: Duration,
}

impl FixedDelayTrigger {
    pub fn new(delay: Duration) -> FixedDelayTrigger {
        FixedDelayTrigger { delay }
    }
}

impl Trigger for FixedDelayTrigger {
    fn next_execution(&self, context: &TriggerContext) -> Option<Instant> {
        let base = context.last_completion.unwrap_or(context.now);
        Some(base + self.delay)
    }
}

/// Fires at a fixed period measured from the previous scheduled instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedRateTrigger {
    period: Duration,
}

impl FixedRateTrigger {
    pub fn new(period: Duration) -> FixedRateTrigger {
        FixedRateTrigger { period }
    }
}

impl Trigger for FixedRateTrigger {
    fn next_execution(&self, context: &TriggerContext) -> Option<Instant> {
        let base = context.last_scheduled.unwrap_or(context.now);
        Some(base + self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_trigger() {
        let trigger = FixedDelayTrigger::new(Duration::from_millis(100));
        let now = Instant::now();

        let first = trigger.next_execution(&TriggerContext::initial(now)).unwrap();
        assert_eq!(first, now + Duration::from_millis(100));

        let completed = now + Duration::from_millis(150);
        let context = TriggerContext {
            now: completed,
            last_scheduled: Some(first),
            last_completion: Some(completed),
        };
        let second = trigger.next_execution(&context).unwrap();
        assert_eq!(second, completed + Duration::from_millis(100));
    }

    #[test]
    fn test_fixed_rate_trigger() {
        let trigger = FixedRateTrigger::new(Duration::from_millis(100));
        let now = Instant::now();

        let first = trigger.next_execution(&TriggerContext::initial(now)).unwrap();
        assert_eq!(first, now + Duration::from_millis(100));

        let context = TriggerContext {
            now: first + Duration::from_millis(30),
            last_scheduled: Some(first),
            last_completion: Some(first + Duration::from_millis(5)),
        };
        let second = trigger.next_execution(&context).unwrap();
        assert_eq!(second, first + Duration::from_millis(100));
    }
}
