//! Keystroke debouncing for typeahead lookups.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    last_trigger: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_trigger: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Record a trigger, restarting the quiet period.
    pub fn trigger(&mut self) {
        self.last_trigger = Some(Instant::now());
    }

    pub fn cancel(&mut self) {
        self.last_trigger = None;
    }

    pub fn is_pending(&self) -> bool {
        self.last_trigger.is_some()
    }

    /// True once, after the quiet period following the last trigger.
    pub fn ready(&mut self) -> bool {
        match self.last_trigger {
            Some(last) if last.elapsed() >= self.delay => {
                self.last_trigger = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until `ready` fires.
    pub fn remaining(&self) -> Option<Duration> {
        self.last_trigger
            .map(|last| self.delay.saturating_sub(last.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_quiet_period() {
        let mut debouncer = Debouncer::from_millis(450);
        assert!(!debouncer.ready());

        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(300)).await;
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!debouncer.ready());
        assert_eq!(debouncer.remaining(), Some(Duration::from_millis(150)));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(debouncer.ready());
        assert!(!debouncer.ready());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_trigger() {
        let mut debouncer = Debouncer::from_millis(300);
        debouncer.trigger();
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!debouncer.ready());
        assert_eq!(debouncer.remaining(), None);
    }
}
