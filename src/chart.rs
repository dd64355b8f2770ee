use crate::model::config::LANES;
use crate::model::song::{ChartNote, SongDescriptor};
use log::debug;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChartError {
    #[error("song '{id}' has an invalid bpm of {bpm}")]
    InvalidBpm { id: String, bpm: f64 },

    #[error("song '{id}' must have at least one note")]
    NoNotes { id: String },

    #[error("song '{id}' has an empty lane pattern")]
    EmptyPattern { id: String },

    #[error("song '{id}' has an invalid lead-in of {lead_in}s")]
    InvalidLeadIn { id: String, lead_in: f64 },

    #[error("song '{id}' uses lane {lane} at pattern step {step}, which is outside the lane range")]
    LaneOutOfRange { id: String, step: usize, lane: usize },
}

/// Generates the chart for a song.
///
/// Note `i` lands on `lead_in + i * 60 / bpm` in lane `pattern[i % pattern.len()]`.
/// The descriptor is validated up front, so a rejected song never yields a partial chart.
pub fn build_chart(song: &SongDescriptor) -> Result<Vec<ChartNote>, ChartError> {
    validate(song)?;

    let beat = song.seconds_per_beat();
    let notes: Vec<ChartNote> = (0..song.note_count)
        .map(|i| ChartNote {
            time: song.lead_in + i as f64 * beat,
            lane: song.pattern[i % song.pattern.len()],
        })
        .collect();

    debug!(
        "Built chart for '{}': {} notes, {:.3}s per beat..!",
        song.id,
        notes.len(),
        beat
    );

    Ok(notes)
}

fn validate(song: &SongDescriptor) -> Result<(), ChartError> {
    if !song.bpm.is_finite() || song.bpm <= 0.0 {
        return Err(ChartError::InvalidBpm {
            id: song.id.clone(),
            bpm: song.bpm,
        });
    }

    if song.note_count < 1 {
        return Err(ChartError::NoNotes { id: song.id.clone() });
    }

    if song.pattern.is_empty() {
        return Err(ChartError::EmptyPattern { id: song.id.clone() });
    }

    if !song.lead_in.is_finite() || song.lead_in < 0.0 {
        return Err(ChartError::InvalidLeadIn {
            id: song.id.clone(),
            lead_in: song.lead_in,
        });
    }

    if let Some((step, &lane)) = song.pattern.iter().enumerate().find(|(_, l)| **l >= LANES) {
        return Err(ChartError::LaneOutOfRange {
            id: song.id.clone(),
            step,
            lane,
        });
    }

    Ok(())
}
