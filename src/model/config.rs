use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const LANES: usize = 4;
pub const LANE_KEYS: [char; LANES] = ['a', 's', 'd', 'f'];
pub const SCROLL_SPEED_PX_PER_SEC: f64 = 220.0;
pub const HIT_FLASH_DURATION: f64 = 0.25;
pub const FEEDBACK_DURATION: f64 = 0.5;
pub const PREPARE_DURATION: f64 = 5.0;
pub const COUNTDOWN_DURATION: f64 = 3.0;

#[derive(Parser, Debug)]
#[command(
    name = "melody_rush",
    about = "Four lanes, one hit-line: play a Melody Rush chart from the terminal."
)]
pub struct Args {
    /// Id of the song to play.
    #[arg(short, long, default_value = "demo-120")]
    pub song: String,

    /// JSON file with additional song descriptors (an array of songs).
    #[arg(long = "songs")]
    pub songs_file: Option<PathBuf>,

    /// Comma separated player names, one turn each per round.
    #[arg(short, long, default_value = "Player 1")]
    pub players: String,

    /// Where lane presses come from: autoplay|keyboard.
    #[arg(short, long, default_value = "autoplay")]
    pub input: String,

    /// Autoplay press offset in milliseconds (negative = early).
    #[arg(long = "autoplay-offset", default_value_t = 0.0, allow_negative_numbers = true)]
    pub autoplay_offset_ms: f64,

    /// Frames per second for the game loop.
    #[arg(long, default_value_t = 120)]
    pub fps: u32,

    /// Seconds of preparation before the countdown.
    #[arg(long = "prepare", default_value_t = PREPARE_DURATION)]
    pub prepare_duration: f64,

    /// Dry run (print the first dry_run_max chart notes and exit).
    #[arg(short, long, default_value_t = false)]
    pub dry_run: bool,

    /// Maximum notes to print in dry run.
    #[arg(long, default_value_t = 80)]
    pub dry_run_max: usize,

    /// Print the final standings as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Prints extra information to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Timing windows in seconds, measured as the absolute distance to the note.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TimingWindows {
    pub perfect: f64,
    pub good: f64,
    /// Widest window a press can still claim a note in; also the lapse after
    /// which an untouched note is missed.
    pub late: f64,
}

impl Default for TimingWindows {
    fn default() -> Self {
        Self {
            perfect: 0.07,
            good: 0.14,
            late: 0.18,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub windows: TimingWindows,
    pub prepare_duration: f64,
    pub countdown_duration: f64,
    pub hit_flash_duration: f64,
    pub feedback_duration: f64,
    pub lane_keys: Vec<char>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            windows: TimingWindows::default(),
            prepare_duration: PREPARE_DURATION,
            countdown_duration: COUNTDOWN_DURATION,
            hit_flash_duration: HIT_FLASH_DURATION,
            feedback_duration: FEEDBACK_DURATION,
            lane_keys: LANE_KEYS.to_vec(),
        }
    }
}

impl SessionConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            prepare_duration: args.prepare_duration.max(0.0),
            ..Self::default()
        }
    }
}
