//! Autoplay key source: presses every note's key on time.

use anyhow::bail;
use log::debug;
use std::sync::Mutex;

use crate::engine::ClockPhase;
use crate::input::{KeyEvent, KeySource};
use crate::model::song::ChartNote;

#[derive(Debug, Clone, Copy)]
struct AutoplayEvent {
    time: f64,
    event: KeyEvent,
}

/// Replays a chart as key presses, optionally shifted by a fixed offset.
#[derive(Debug)]
pub struct AutoPlay {
    events: Vec<AutoplayEvent>,
    cursor: Mutex<usize>,
}

impl AutoPlay {
    /// How long each autoplay key stays held.
    const PRESS_DURATION: f64 = 0.05;

    /// `offset` is in seconds, negative presses early.
    pub fn new(chart: &[ChartNote], lane_keys: &[char], offset: f64) -> Self {
        let mut events = Vec::with_capacity(chart.len() * 2);

        for note in chart {
            let Some(&key) = lane_keys.get(note.lane) else {
                debug!("Autoplay has no key for lane {}, skipping note at {:.3}s", note.lane, note.time);
                continue;
            };

            let press = note.time + offset;
            events.push(AutoplayEvent {
                time: press,
                event: KeyEvent::Down(key),
            });
            events.push(AutoplayEvent {
                time: press + Self::PRESS_DURATION,
                event: KeyEvent::Up(key),
            });
        }

        events.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            events,
            cursor: Mutex::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl KeySource for AutoPlay {
    fn poll(&self, phase: ClockPhase, now: f64) -> anyhow::Result<Vec<KeyEvent>> {
        if phase != ClockPhase::Running {
            return Ok(Vec::new());
        }

        let Ok(mut cursor) = self.cursor.lock() else {
            bail!("Failed to lock autoplay cursor..!")
        };

        let due = self.events[*cursor..]
            .iter()
            .take_while(|e| e.time <= now)
            .map(|e| e.event)
            .collect::<Vec<_>>();
        *cursor += due.len();

        Ok(due)
    }

    fn reset(&self) -> anyhow::Result<()> {
        let Ok(mut cursor) = self.cursor.lock() else {
            bail!("Failed to lock autoplay cursor..!")
        };
        *cursor = 0;

        Ok(())
    }
}
