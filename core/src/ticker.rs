use core::time::Duration;
use web_time::Instant;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickerState {
    Idle,
    Running,
    Paused,
    Cancelled,
}

/// Cooperative fixed-period scheduler.
///
/// The ticker never fires on its own, the owner polls it with the current time. At most one tick
/// is reported per poll and missed periods are dropped, so a stall or a pause never produces a
/// burst of ticks. Once cancelled it stays silent forever.
#[derive(Clone, Debug)]
pub struct Ticker {
    period: Duration,
    state: TickerState,
    next_due: Option<Instant>,
}

impl Ticker {
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Self::MIN_PERIOD),
            state: TickerState::Idle,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> TickerState {
        self.state
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn start(&mut self, now: Instant) {
        if self.state == TickerState::Cancelled {
            log::warn!("Ticker already cancelled, not starting");
            return;
        }
        self.state = TickerState::Running;
        self.next_due = Some(now + self.period);
    }

    pub fn pause(&mut self) {
        if self.state == TickerState::Running {
            self.state = TickerState::Paused;
            self.next_due = None;
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.state == TickerState::Paused {
            self.state = TickerState::Running;
            self.next_due = Some(now + self.period);
        }
    }

    pub fn stop(&mut self) {
        if self.state != TickerState::Cancelled {
            self.state = TickerState::Idle;
            self.next_due = None;
        }
    }

    pub fn cancel(&mut self) {
        self.state = TickerState::Cancelled;
        self.next_due = None;
    }

    /// Reports whether a tick is due at `now`, and if so schedules the following one.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.state != TickerState::Running {
            return false;
        }
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let next = due + self.period;
        self.next_due = Some(if next > now { next } else { now + self.period });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(300);

    #[test]
    fn fires_once_per_period() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(PERIOD);
        ticker.start(t0);

        assert!(!ticker.poll(t0 + Duration::from_millis(299)));
        assert!(ticker.poll(t0 + PERIOD));
        assert!(!ticker.poll(t0 + PERIOD));
        assert!(ticker.poll(t0 + PERIOD * 2));
    }

    #[test]
    fn keeps_cadence_when_polled_late() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(PERIOD);
        ticker.start(t0);

        assert!(ticker.poll(t0 + Duration::from_millis(350)));
        assert_eq!(ticker.next_due(), Some(t0 + PERIOD * 2));
    }

    #[test]
    fn no_catch_up_after_stall() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(PERIOD);
        ticker.start(t0);

        let late = t0 + PERIOD * 10;
        assert!(ticker.poll(late));
        assert!(!ticker.poll(late));
        assert_eq!(ticker.next_due(), Some(late + PERIOD));
    }

    #[test]
    fn paused_ticker_is_silent_and_resumes_without_burst() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(PERIOD);
        ticker.start(t0);
        ticker.pause();

        assert!(!ticker.poll(t0 + PERIOD * 5));

        let resumed_at = t0 + PERIOD * 5;
        ticker.resume(resumed_at);
        assert!(!ticker.poll(resumed_at));
        assert!(ticker.poll(resumed_at + PERIOD));
        assert!(!ticker.poll(resumed_at + PERIOD));
    }

    #[test]
    fn cancelled_ticker_never_fires_again() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(PERIOD);
        ticker.start(t0);
        ticker.cancel();

        assert!(!ticker.poll(t0 + PERIOD));
        ticker.start(t0);
        ticker.resume(t0);
        assert_eq!(ticker.state(), TickerState::Cancelled);
        assert!(!ticker.poll(t0 + PERIOD * 3));
    }

    #[test]
    fn zero_period_is_clamped() {
        assert_eq!(Ticker::new(Duration::ZERO).period(), Ticker::MIN_PERIOD);
    }
}
