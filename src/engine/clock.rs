use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClockPhase {
    #[default]
    Idle,
    Preparing,
    Countdown,
    Running,
    Finished,
}

impl fmt::Display for ClockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Countdown => "countdown",
            Self::Running => "running",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot go from {from} to {to}")]
pub struct PhaseError {
    pub from: ClockPhase,
    pub to: ClockPhase,
}

/// Play clock plus the prepare/countdown lifecycle in front of it.
///
/// `idle -> preparing -> countdown -> running` happens on its own once started;
/// leaving `running` is always requested from outside through [`GameClock::finish`].
#[derive(Debug, Clone, PartialEq)]
pub struct GameClock {
    phase: ClockPhase,
    time: f64,
    prepare_remaining: f64,
    countdown_remaining: f64,
    prepare_duration: f64,
    countdown_duration: f64,
}

impl GameClock {
    pub fn new(prepare_duration: f64, countdown_duration: f64) -> Self {
        Self {
            phase: ClockPhase::Idle,
            time: 0.0,
            prepare_remaining: 0.0,
            countdown_remaining: 0.0,
            prepare_duration,
            countdown_duration,
        }
    }

    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    /// Seconds of play time, frozen outside of `running`.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn prepare_remaining(&self) -> f64 {
        self.prepare_remaining
    }

    pub fn countdown_remaining(&self) -> f64 {
        self.countdown_remaining
    }

    pub fn is_running(&self) -> bool {
        self.phase == ClockPhase::Running
    }

    /// Enters `preparing` from `idle`, or from `finished` as a restart.
    /// Play time goes back to zero.
    pub fn start(&mut self) -> Result<(), PhaseError> {
        match self.phase {
            ClockPhase::Idle | ClockPhase::Finished => {
                self.time = 0.0;
                self.countdown_remaining = 0.0;
                self.prepare_remaining = self.prepare_duration;
                self.enter(ClockPhase::Preparing);
                Ok(())
            }
            from => Err(PhaseError {
                from,
                to: ClockPhase::Preparing,
            }),
        }
    }

    /// Ends the turn. Play time stays where it stopped.
    pub fn finish(&mut self) -> Result<(), PhaseError> {
        match self.phase {
            ClockPhase::Preparing | ClockPhase::Countdown | ClockPhase::Running => {
                self.prepare_remaining = 0.0;
                self.countdown_remaining = 0.0;
                self.enter(ClockPhase::Finished);
                Ok(())
            }
            from => Err(PhaseError {
                from,
                to: ClockPhase::Finished,
            }),
        }
    }

    /// Advances play time by `dt` while running. Returns the new play time.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if self.is_running() {
            self.time += sanitize(dt);
        }
        self.time
    }

    /// Runs the prepare and countdown timers down by `dt`.
    /// Returns the phase entered on this tick, if any.
    pub fn tick_phase(&mut self, dt: f64) -> Option<ClockPhase> {
        let dt = sanitize(dt);

        match self.phase {
            ClockPhase::Preparing => {
                self.prepare_remaining = (self.prepare_remaining - dt).max(0.0);
                if self.prepare_remaining <= 0.0 {
                    self.countdown_remaining = self.countdown_duration;
                    self.enter(ClockPhase::Countdown);
                    return Some(ClockPhase::Countdown);
                }
            }
            ClockPhase::Countdown => {
                self.countdown_remaining = (self.countdown_remaining - dt).max(0.0);
                if self.countdown_remaining <= 0.0 {
                    self.enter(ClockPhase::Running);
                    return Some(ClockPhase::Running);
                }
            }
            _ => {}
        }

        None
    }

    fn enter(&mut self, phase: ClockPhase) {
        if phase == ClockPhase::Running || phase == ClockPhase::Finished {
            info!("Clock {} -> {} at {:.3}s..!", self.phase, phase, self.time);
        } else {
            debug!("Clock {} -> {}", self.phase, phase);
        }
        self.phase = phase;
    }
}

/// Frame deltas that are negative or not finite count as zero.
pub(crate) fn sanitize(dt: f64) -> f64 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}
