use log::info;

/// Where lane presses come from during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Every note pressed on time by the chart itself.
    #[default]
    Autoplay,

    /// The physical keyboard.
    Keyboard,
}

pub fn parse_input_mode(s: &str) -> InputMode {
    match s.to_lowercase().as_str() {
        "a" | "auto" | "autoplay" => InputMode::Autoplay,
        "k" | "kb" | "keys" | "keyboard" => InputMode::Keyboard,
        other => {
            info!("Unknown input mode '{}', defaulting to `autoplay`..!", other);
            InputMode::Autoplay
        }
    }
}

/// Splits a comma separated list of player names, dropping blanks.
pub fn parse_player_names(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}
