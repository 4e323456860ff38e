//! A toolkit-independent debouncer.
//!
//! The caller owns the clock: every call passes the current time as a
//! [`Duration`] since any fixed origin (an `Instant`, `performance.now()`,
//! a test counter). Nothing here sleeps or spawns.

use std::time::Duration;
use tracing::debug;

/// Holds at most one pending piece of work and releases it once no newer
/// request has arrived for a full quiet window.
#[derive(Debug, Clone)]
pub struct Debouncer<W> {
    quiet: Duration,
    pending: Option<Pending<W>>,
    next_ticket: u64,
}

#[derive(Debug, Clone)]
struct Pending<W> {
    ticket: u64,
    due: Duration,
    work: W,
}

impl<W> Debouncer<W> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            next_ticket: 0,
        }
    }

    /// Schedule `work` to run one quiet window after `now`, replacing
    /// whatever was pending. Returns a ticket identifying this request.
    pub fn request(&mut self, now: Duration, work: W) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        if let Some(old) = self.pending.take() {
            debug!(ticket = old.ticket, "cancelled superseded request");
        }
        let due = now.saturating_add(self.quiet);
        debug!(ticket, due_ms = due.as_millis() as u64, "scheduled request");
        self.pending = Some(Pending { ticket, due, work });
        ticket
    }

    /// Drop the pending request, if any, and return its work.
    pub fn cancel(&mut self) -> Option<W> {
        self.pending.take().map(|p| p.work)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending request becomes due.
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Hand out the pending work if its quiet window has elapsed by `now`.
    ///
    /// Each request is returned at most once.
    pub fn poll(&mut self, now: Duration) -> Option<W> {
        match &self.pending {
            Some(p) if now >= p.due => {
                let p = self.pending.take()?;
                debug!(ticket = p.ticket, "releasing request");
                Some(p.work)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn waits_for_the_quiet_window() {
        let mut d = Debouncer::new(ms(300));
        d.request(ms(0), "a");
        assert_eq!(d.poll(ms(299)), None);
        assert_eq!(d.poll(ms(300)), Some("a"));
        assert_eq!(d.poll(ms(301)), None);
    }

    #[test]
    fn newer_requests_supersede_older_ones() {
        let mut d = Debouncer::new(ms(300));
        d.request(ms(0), 1);
        d.request(ms(100), 2);
        d.request(ms(250), 3);
        // the first deadline has passed but was cancelled
        assert_eq!(d.poll(ms(400)), None);
        assert_eq!(d.deadline(), Some(ms(550)));
        assert_eq!(d.poll(ms(550)), Some(3));
        assert!(!d.is_pending());
    }

    #[test]
    fn cancel_clears_pending_work() {
        let mut d = Debouncer::new(ms(10));
        let first = d.request(ms(0), 'x');
        let second = d.request(ms(1), 'y');
        assert!(second > first);
        assert_eq!(d.cancel(), Some('y'));
        assert_eq!(d.poll(ms(1000)), None);
    }
}
