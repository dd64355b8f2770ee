use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::score::ScoreBoard;
use crate::model::config::{SessionConfig, TimingWindows};
use crate::model::song::ChartNote;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Judgement {
    Perfect,
    Good,
    Miss,
}

impl Judgement {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Perfect => "PERFECT",
            Self::Good => "GOOD",
            Self::Miss => "MISS",
        }
    }

    pub fn is_hit(&self) -> bool {
        !matches!(self, Self::Miss)
    }

    /// Classifies an absolute timing error. Anything past the good window is a miss.
    pub fn classify(delta: f64, windows: &TimingWindows) -> Self {
        if delta <= windows.perfect {
            Self::Perfect
        } else if delta <= windows.good {
            Self::Good
        } else {
            Self::Miss
        }
    }
}

impl fmt::Display for Judgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A chart note as it lives through one session.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RuntimeNote {
    pub note: ChartNote,
    /// `None` until judged, then fixed for the rest of the session.
    pub judgement: Option<Judgement>,
    /// Seconds of hit flash left to display.
    pub hit_flash: f64,
}

impl RuntimeNote {
    pub fn new(note: ChartNote) -> Self {
        Self {
            note,
            judgement: None,
            hit_flash: 0.0,
        }
    }

    pub fn time(&self) -> f64 {
        self.note.time
    }

    pub fn lane(&self) -> usize {
        self.note.lane
    }

    pub fn is_judged(&self) -> bool {
        self.judgement.is_some()
    }

    /// Distance above the hit-line in pixels for a renderer scrolling at `speed_px_per_sec`.
    /// Negative once the note has passed the line.
    pub fn offset_px(&self, now: f64, speed_px_per_sec: f64) -> f64 {
        (self.note.time - now) * speed_px_per_sec
    }
}

/// Outcome of one judged note.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub judgement: Judgement,
    /// Signed timing error in seconds, negative when early.
    pub delta: f64,
    pub gained: u64,
    pub combo: u32,
}

/// Finds the unjudged note on `lane` closest to `now`, within the late window.
///
/// Ties go to the earliest note time, then to the lower index.
pub fn find_candidate(
    notes: &[RuntimeNote],
    lane: usize,
    now: f64,
    windows: &TimingWindows,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (idx, n) in notes.iter().enumerate() {
        if n.lane() != lane || n.is_judged() {
            continue;
        }

        let delta = (n.time() - now).abs();
        if delta > windows.late {
            continue;
        }

        let better = match best {
            None => true,
            Some((best_idx, best_delta)) => {
                delta < best_delta || (delta == best_delta && n.time() < notes[best_idx].time())
            }
        };

        if better {
            best = Some((idx, delta));
        }
    }

    best.map(|(idx, _)| idx)
}

/// Judges a selected note against `now` and books the outcome on `board`.
///
/// Returns `None` when the note was already judged.
pub fn judge(
    note: &mut RuntimeNote,
    now: f64,
    config: &SessionConfig,
    board: &mut ScoreBoard,
) -> Option<Hit> {
    if note.is_judged() {
        return None;
    }

    let delta = now - note.time();
    let judgement = Judgement::classify(delta.abs(), &config.windows);

    note.judgement = Some(judgement);
    if judgement.is_hit() {
        note.hit_flash = config.hit_flash_duration;
    }

    let gained = board.apply(judgement);

    debug!(
        "{} on lane {} | note at {:.3}s | delta {:+.3}s | +{} (combo {})",
        judgement,
        note.lane(),
        note.time(),
        delta,
        gained,
        board.combo()
    );

    Some(Hit {
        judgement,
        delta,
        gained,
        combo: board.combo(),
    })
}

/// Marks every unjudged note lapsed by more than the late window as a miss.
///
/// Returns how many notes were missed by this scan.
pub fn mark_late_misses(
    notes: &mut [RuntimeNote],
    now: f64,
    windows: &TimingWindows,
    board: &mut ScoreBoard,
) -> usize {
    let mut missed = 0;

    for n in notes.iter_mut().filter(|n| !n.is_judged()) {
        if now - n.time() > windows.late {
            n.judgement = Some(Judgement::Miss);
            board.apply(Judgement::Miss);
            missed += 1;

            debug!("Late MISS on lane {} | note at {:.3}s | now {:.3}s", n.lane(), n.time(), now);
        }
    }

    missed
}
