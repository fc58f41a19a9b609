//! Trailing-edge debouncing of search input, driven by the host clock.
//!
//! The palette owns no timer. Hosts report input together with the time it
//! happened and call [`Debouncer::take_due`] from their own loop (or
//! [`Palette::tick`](crate::Palette::tick)); the last input wins.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Option<Duration>,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    /// Creates a debouncer waiting `millis` milliseconds after the last input.
    ///
    /// A non-positive value disables debouncing.
    #[must_use]
    pub fn new(millis: i64) -> Self {
        let delay = u64::try_from(millis)
            .ok()
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis);
        Self {
            delay,
            pending: None,
        }
    }

    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        self.delay.is_none()
    }

    /// Records `text` as the latest input.
    ///
    /// Returns the text back when it should run now; otherwise it replaces any
    /// pending input and waits for its deadline.
    pub fn schedule(&mut self, text: String, now: Instant) -> Option<String> {
        match self.delay {
            None => {
                self.pending = None;
                Some(text)
            }
            Some(delay) => {
                if self.pending.is_some() {
                    tracing::trace!("superseding pending search");
                }
                self.pending = Some((text, now + delay));
                None
            }
        }
    }

    /// Takes the pending input if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(text, _)| text),
            _ => None,
        }
    }

    /// Drops the pending input, if any.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_delay_runs_immediately() {
        let now = Instant::now();
        for millis in [0, -5] {
            let mut debouncer = Debouncer::new(millis);
            assert!(debouncer.is_immediate());
            assert_eq!(debouncer.schedule("a".into(), now), Some("a".to_string()));
            assert_eq!(debouncer.deadline(), None);
        }
    }

    #[test]
    fn last_input_wins() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(100);

        assert_eq!(debouncer.schedule("f".into(), start), None);
        assert_eq!(debouncer.schedule("fo".into(), start + Duration::from_millis(50)), None);
        assert_eq!(debouncer.take_due(start + Duration::from_millis(120)), None);
        assert_eq!(
            debouncer.take_due(start + Duration::from_millis(150)),
            Some("fo".to_string())
        );
        assert_eq!(debouncer.take_due(start + Duration::from_millis(500)), None);
    }

    #[test]
    fn cancel_drops_pending() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(10);
        debouncer.schedule("x".into(), now);
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        assert_eq!(debouncer.take_due(now + Duration::from_secs(1)), None);
    }
}
