//! Countdown timer.
//!
//! Holds no clock of its own: a driver calls [`Countdown::tick`] once per
//! second (the CLI uses `tokio::time::interval`), which keeps the countdown
//! deterministic under test.

/// What a single tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The timer is not running; nothing was published.
    Idle,
    /// Time remains; carries the newly published value.
    Remaining(u32),
    /// The countdown reached zero. Emitted exactly once per `start`.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Stopped,
    Running,
    Expired,
}

/// A one-shot countdown that publishes `n-1, n-2, .., 0` and then stops.
///
/// The tick that reaches zero publishes 0 and carries the expiry, so
/// `start(3)` expires on the third tick. `start(0)` expires on its first.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u32,
    state: TimerState,
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            remaining: 0,
            state: TimerState::Stopped,
        }
    }

    /// Arm the countdown. Restarting discards any previous run.
    pub fn start(&mut self, duration_secs: u32) {
        self.remaining = duration_secs;
        self.state = TimerState::Running;
    }

    /// Cancel pending ticks. Later ticks are `Idle`.
    pub fn stop(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Stopped;
        }
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> Tick {
        if self.state != TimerState::Running {
            return Tick::Idle;
        }

        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining > 0 {
                return Tick::Remaining(self.remaining);
            }
        }

        self.state = TimerState::Expired;
        Tick::Expired
    }

    /// Last published remaining time, in seconds.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn has_expired(&self) -> bool {
        self.state == TimerState::Expired
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Format seconds as `h:mm:ss`.
pub fn format_clock(total_secs: u32) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive a countdown until it stops, collecting published values.
    fn run(countdown: &mut Countdown) -> (Vec<u32>, usize) {
        let mut published = Vec::new();
        let mut expiries = 0;
        for _ in 0..100 {
            match countdown.tick() {
                Tick::Remaining(n) => published.push(n),
                Tick::Expired => {
                    published.push(0);
                    expiries += 1;
                }
                Tick::Idle => {}
            }
        }
        (published, expiries)
    }

    #[test]
    fn publishes_strictly_decreasing_then_expires_once() {
        let mut countdown = Countdown::new();
        countdown.start(5);
        let (published, expiries) = run(&mut countdown);
        assert_eq!(published, vec![4, 3, 2, 1, 0]);
        assert_eq!(expiries, 1);
        assert!(countdown.has_expired());
        assert!(!countdown.is_running());
    }

    #[test]
    fn three_seconds_expire_on_third_tick() {
        let mut countdown = Countdown::new();
        countdown.start(3);
        assert_eq!(countdown.tick(), Tick::Remaining(2));
        assert_eq!(countdown.tick(), Tick::Remaining(1));
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Idle);
    }

    #[test]
    fn zero_duration_expires_immediately() {
        let mut countdown = Countdown::new();
        countdown.start(0);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Idle);
    }

    #[test]
    fn stop_cancels_pending_ticks() {
        let mut countdown = Countdown::new();
        countdown.start(2);
        assert_eq!(countdown.tick(), Tick::Remaining(1));
        countdown.stop();
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.remaining(), 1);
        assert!(!countdown.has_expired());
    }

    #[test]
    fn never_started_is_idle() {
        let mut countdown = Countdown::default();
        assert_eq!(countdown.tick(), Tick::Idle);
    }

    #[test]
    fn restart_rearms() {
        let mut countdown = Countdown::new();
        countdown.start(1);
        assert_eq!(countdown.tick(), Tick::Expired);
        countdown.start(2);
        let (published, expiries) = run(&mut countdown);
        assert_eq!(published, vec![1, 0]);
        assert_eq!(expiries, 1);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "0:00:00");
        assert_eq!(format_clock(65), "0:01:05");
        assert_eq!(format_clock(3725), "1:02:05");
    }
}
