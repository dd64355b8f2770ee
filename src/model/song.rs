use serde::{Deserialize, Serialize};

/// Song definition a chart is generated from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SongDescriptor {
    pub id: String,
    pub title: String,
    pub bpm: f64,
    pub note_count: usize,
    /// Seconds before the first note reaches the hit-line.
    pub lead_in: f64,
    /// Lane cycle, repeated until `note_count` notes exist.
    pub pattern: Vec<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_end_time: Option<f64>,
}

impl SongDescriptor {
    pub fn new(id: &str, title: &str, bpm: f64, note_count: usize, lead_in: f64, pattern: &[usize]) -> Self {
        Self {
            id: id.to_owned(),
            title: title.to_owned(),
            bpm,
            note_count,
            lead_in,
            pattern: pattern.to_vec(),
            audio_path: None,
            audio_start_time: None,
            audio_end_time: None,
        }
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ChartNote {
    /// Seconds from session start at which the note aligns with the hit-line.
    pub time: f64,
    pub lane: usize,
}

/// The songs shipped with the game.
pub fn builtin_songs() -> Vec<SongDescriptor> {
    let mut superstition = SongDescriptor::new(
        "superstition",
        "Stevie Wonder - Superstition",
        100.0,
        75,
        1.5,
        &[
            0, 2, 0, 2, 1, 3, 1, 3, 0, 2, 3, 1, 2, 0, 3, 1, 0, 1, 2, 3, 2, 3, 1, 0,
        ],
    );
    superstition.audio_path = Some(String::from("assets/song/Stevie_Wonder_-_Superstition.mp3"));
    superstition.audio_start_time = Some(5.0);
    superstition.audio_end_time = Some(50.0);

    vec![
        SongDescriptor::new("demo-120", "Demo - 120 BPM", 120.0, 32, 2.0, &[0, 1, 2, 3, 2, 1, 0, 3]),
        SongDescriptor::new("demo-140", "Demo - 140 BPM", 140.0, 40, 2.0, &[0, 2, 1, 3, 3, 1, 2, 0]),
        superstition,
    ]
}
