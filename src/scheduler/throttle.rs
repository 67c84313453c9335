use instant::Instant;
use std::time::Duration;

/// Which end of the window emits a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    /// The first submission passes straight through and opens a cooldown;
    /// the latest value submitted during the cooldown fires when it ends.
    Leading,
    /// The first submission opens a window; the latest value fires when the
    /// window elapses.
    #[default]
    Trailing,
}

/// Rate limiter that coalesces bursts into at most one value per interval.
///
/// The throttle owns no timer thread. Callers hand in `now` and drive it
/// with [`Throttle::poll`], typically once per frame or from a timer task
/// sleeping until [`Throttle::deadline`].
#[derive(Debug)]
pub struct Throttle<T> {
    interval: Duration,
    edge: Edge,
    pending: Option<T>,
    deadline: Option<Instant>,
    cancelled: bool,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self::with_edge(interval, Edge::Trailing)
    }

    pub fn with_edge(interval: Duration, edge: Edge) -> Self {
        Self {
            interval,
            edge,
            pending: None,
            deadline: None,
            cancelled: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offers a value. Returns it back only when a leading-edge throttle
    /// lets it through immediately; otherwise it replaces any pending value.
    pub fn submit(&mut self, value: T, now: Instant) -> Option<T> {
        if self.cancelled {
            return None;
        }

        match (self.edge, self.deadline) {
            (Edge::Leading, None) => {
                self.deadline = Some(now + self.interval);
                Some(value)
            }
            (Edge::Leading, Some(_)) => {
                self.pending = Some(value);
                None
            }
            (Edge::Trailing, deadline) => {
                self.pending = Some(value);
                if deadline.is_none() {
                    self.deadline = Some(now + self.interval);
                }
                None
            }
        }
    }

    /// Emits the pending value once the window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                let fired = self.pending.take();
                // A leading throttle that fired keeps cooling down.
                self.deadline = match (self.edge, fired.is_some()) {
                    (Edge::Leading, true) => Some(now + self.interval),
                    _ => None,
                };
                fired
            }
            _ => None,
        }
    }

    /// Takes the pending value without waiting for the window
    pub fn flush(&mut self) -> Option<T> {
        let pending = self.pending.take();
        if pending.is_some() {
            self.deadline = None;
        }
        pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// When the next value can fire, if one is waiting
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().and(self.deadline)
    }

    /// Drops the pending value and stops accepting new ones
    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_trailing_coalesces_to_latest() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(ms(100));

        for i in 0..10 {
            assert_eq!(throttle.submit(i, t0 + ms(i as u64 * 5)), None);
        }
        assert_eq!(throttle.deadline(), Some(t0 + ms(100)));
        assert_eq!(throttle.poll(t0 + ms(99)), None);
        assert_eq!(throttle.poll(t0 + ms(100)), Some(9));
        assert_eq!(throttle.poll(t0 + ms(300)), None);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_trailing_window_reopens_after_fire() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(ms(100));
        throttle.submit("a", t0);
        assert_eq!(throttle.poll(t0 + ms(100)), Some("a"));

        throttle.submit("b", t0 + ms(150));
        assert_eq!(throttle.deadline(), Some(t0 + ms(250)));
        assert_eq!(throttle.poll(t0 + ms(200)), None);
        assert_eq!(throttle.poll(t0 + ms(250)), Some("b"));
    }

    #[test]
    fn test_leading_passes_first_value() {
        let t0 = Instant::now();
        let mut throttle = Throttle::with_edge(ms(100), Edge::Leading);

        assert_eq!(throttle.submit(1, t0), Some(1));
        assert_eq!(throttle.submit(2, t0 + ms(10)), None);
        assert_eq!(throttle.submit(3, t0 + ms(20)), None);
        assert_eq!(throttle.poll(t0 + ms(100)), Some(3));
        // still cooling down after the trailing fire
        assert_eq!(throttle.submit(4, t0 + ms(150)), None);
        assert_eq!(throttle.poll(t0 + ms(200)), Some(4));
        assert_eq!(throttle.poll(t0 + ms(300)), None);
        assert_eq!(throttle.submit(5, t0 + ms(400)), Some(5));
    }

    #[test]
    fn test_flush_and_cancel() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(ms(100));
        throttle.submit(1, t0);
        assert_eq!(throttle.flush(), Some(1));
        assert_eq!(throttle.poll(t0 + ms(100)), None);

        throttle.submit(2, t0 + ms(10));
        throttle.cancel();
        assert!(throttle.is_cancelled());
        assert_eq!(throttle.poll(t0 + ms(500)), None);
        assert_eq!(throttle.submit(3, t0 + ms(600)), None);
        assert_eq!(throttle.deadline(), None);
    }
}
