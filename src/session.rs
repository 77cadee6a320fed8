//! Timed typing sessions.
//!
//! The timer is armed by the user, starts counting on the first keystroke
//! the typing engine consumes, and freezes typing when it reaches zero.

use std::time::Duration;

use crate::constants::DEFAULT_TIMER;
use crate::typing::TypingStats;

/// Characters per word used for WPM.
const CHARS_PER_WORD: f64 = 5.0;

/// Result of a finished timed session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    /// Net words per minute (correct characters / 5 per minute)
    pub wpm: f64,
    /// Percentage of typed characters that were correct
    pub accuracy: f64,
    /// Words completed
    pub words: u32,
    /// Correct characters typed
    pub correct_chars: u32,
    /// Incorrect characters typed
    pub incorrect_chars: u32,
    /// Session length
    pub duration: Duration,
}

impl SessionSummary {
    /// Summarizes typing statistics over `duration`.
    #[must_use]
    pub fn from_stats(stats: &TypingStats, duration: Duration) -> Self {
        let minutes = duration.as_secs_f64() / 60.0;
        let wpm = if minutes > 0.0 {
            f64::from(stats.correct_chars) / CHARS_PER_WORD / minutes
        } else {
            0.0
        };

        Self {
            wpm,
            accuracy: stats.accuracy(),
            words: stats.completed_words,
            correct_chars: stats.correct_chars,
            incorrect_chars: stats.incorrect_chars,
            duration,
        }
    }
}

/// Timer state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerState {
    /// Free typing, no timer shown
    Off,
    /// Waiting for the first keystroke
    Armed,
    /// Counting down
    Running {
        /// Time left
        remaining: Duration,
    },
    /// Time is up; typing is frozen until restart or toggle
    Finished(SessionSummary),
}

/// Session timer.
#[derive(Debug, Clone)]
pub struct SessionController {
    state: TimerState,
    limit: Duration,
}

impl SessionController {
    /// Creates a controller with the timer off.
    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self {
            state: TimerState::Off,
            limit,
        }
    }

    /// Turns the timer off if it is shown, otherwise arms it with `limit`.
    ///
    /// Returns true if the timer is now armed. Either way the caller resets
    /// the other state machines.
    pub fn toggle(&mut self, limit: Duration) -> bool {
        if self.is_active() {
            self.state = TimerState::Off;
            tracing::debug!("Timer off");
            false
        } else {
            self.limit = limit;
            self.state = TimerState::Armed;
            tracing::debug!(limit_secs = limit.as_secs(), "Timer armed");
            true
        }
    }

    /// Re-arms the timer with the current limit, if it is shown.
    pub fn restart(&mut self) {
        if self.is_active() {
            self.state = TimerState::Armed;
        }
    }

    /// Starts the countdown on the first consumed keystroke.
    pub fn on_keystroke(&mut self) {
        if self.state == TimerState::Armed {
            self.state = TimerState::Running {
                remaining: self.limit,
            };
        }
    }

    /// Advances the countdown. Returns the summary on the tick the session ends.
    pub fn tick(&mut self, dt: Duration, stats: &TypingStats) -> Option<SessionSummary> {
        let TimerState::Running { remaining } = self.state else {
            return None;
        };

        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            let summary = SessionSummary::from_stats(stats, self.limit);
            tracing::info!(
                wpm = summary.wpm,
                accuracy = summary.accuracy,
                words = summary.words,
                "Timed session finished"
            );
            self.state = TimerState::Finished(summary);
            Some(summary)
        } else {
            self.state = TimerState::Running { remaining };
            None
        }
    }

    /// False once the session has finished.
    #[must_use]
    pub const fn accepts_input(&self) -> bool {
        !matches!(self.state, TimerState::Finished(_))
    }

    /// True unless the timer is off.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.state, TimerState::Off)
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &TimerState {
        &self.state
    }

    /// Configured limit.
    #[must_use]
    pub const fn limit(&self) -> Duration {
        self.limit
    }

    /// Time left to show, if the timer is shown.
    #[must_use]
    pub const fn remaining(&self) -> Option<Duration> {
        match self.state {
            TimerState::Off => None,
            TimerState::Armed => Some(self.limit),
            TimerState::Running { remaining } => Some(remaining),
            TimerState::Finished(_) => Some(Duration::ZERO),
        }
    }

    /// Summary of the finished session, if any.
    #[must_use]
    pub const fn summary(&self) -> Option<&SessionSummary> {
        match &self.state {
            TimerState::Finished(summary) => Some(summary),
            _ => None,
        }
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(DEFAULT_TIMER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(correct: u32, incorrect: u32, words: u32) -> TypingStats {
        TypingStats {
            correct_chars: correct,
            incorrect_chars: incorrect,
            completed_words: words,
        }
    }

    #[test]
    fn test_toggle_arms_and_disarms() {
        let mut session = SessionController::default();
        assert_eq!(session.state(), &TimerState::Off);

        assert!(session.toggle(Duration::from_secs(15)));
        assert_eq!(session.state(), &TimerState::Armed);
        assert_eq!(session.limit(), Duration::from_secs(15));
        assert_eq!(session.remaining(), Some(Duration::from_secs(15)));

        assert!(!session.toggle(Duration::from_secs(60)));
        assert_eq!(session.state(), &TimerState::Off);
        assert_eq!(session.remaining(), None);
    }

    #[test]
    fn test_countdown_starts_on_keystroke() {
        let mut session = SessionController::default();
        session.toggle(Duration::from_secs(15));

        assert_eq!(session.tick(Duration::from_secs(5), &stats(0, 0, 0)), None);
        assert_eq!(session.state(), &TimerState::Armed);

        session.on_keystroke();
        session.tick(Duration::from_secs(5), &stats(0, 0, 0));
        assert_eq!(session.remaining(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_expiry_produces_summary() {
        let mut session = SessionController::default();
        session.toggle(Duration::from_secs(30));
        session.on_keystroke();

        let typed = stats(150, 10, 28);
        assert_eq!(session.tick(Duration::from_secs(29), &typed), None);
        let summary = session.tick(Duration::from_secs(2), &typed).unwrap();

        // 150 chars / 5 = 30 words in half a minute.
        assert!((summary.wpm - 60.0).abs() < 1e-9);
        assert!((summary.accuracy - 93.75).abs() < 1e-9);
        assert_eq!(summary.words, 28);
        assert_eq!(summary.duration, Duration::from_secs(30));

        assert!(!session.accepts_input());
        assert_eq!(session.summary(), Some(&summary));
        assert_eq!(session.tick(Duration::from_secs(1), &typed), None);
    }

    #[test]
    fn test_restart_rearms_with_same_limit() {
        let mut session = SessionController::default();
        session.toggle(Duration::from_secs(15));
        session.on_keystroke();
        session.tick(Duration::from_secs(20), &stats(1, 0, 0));
        assert!(!session.accepts_input());

        session.restart();
        assert_eq!(session.state(), &TimerState::Armed);
        assert_eq!(session.limit(), Duration::from_secs(15));
        assert!(session.accepts_input());
    }

    #[test]
    fn test_restart_while_off_stays_off() {
        let mut session = SessionController::default();
        session.restart();
        assert_eq!(session.state(), &TimerState::Off);
        assert!(session.accepts_input());
    }
}
