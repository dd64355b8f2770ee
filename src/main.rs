use anyhow::{Result, bail};
use clap::Parser;
use log::{debug, info, warn};
use melody_rush::{
    Args, AutoPlay, ChartNote, Driver, FrameControl, InputMode, KeySource, Roster, SCROLL_SPEED_PX_PER_SEC,
    Session, SessionConfig, Snapshot, build_chart, find_song, parse_input_mode,
    parse_player_names, song_catalogue, turn_over,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Seconds the turn keeps running after the last note is judged.
const TURN_TAIL: f64 = 1.0;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mode = parse_input_mode(&args.input);

    let songs = song_catalogue(args.songs_file.as_ref())?;
    let Some(song) = find_song(&songs, &args.song) else {
        let ids: Vec<&str> = songs.iter().map(|s| s.id.as_str()).collect();
        bail!("Unknown song '{}', available: {}", args.song, ids.join(", "));
    };

    let chart = match build_chart(song) {
        Ok(chart) => chart,
        Err(why) => bail!("Song '{}' is unplayable: {}", song.title, why),
    };

    info!(
        "Loaded '{}' | {} BPM | {} notes | lead-in {:.2}s..!",
        song.title,
        song.bpm,
        chart.len(),
        song.lead_in
    );
    if let (Some(path), Some(start)) = (&song.audio_path, song.audio_start_time) {
        debug!("Backing track {} from {:.2}s", path, start);
    }

    if args.dry_run {
        info!("Previewing at most {} notes..!", args.dry_run_max);
        let keys = SessionConfig::default().lane_keys;
        for (i, note) in chart.iter().take(args.dry_run_max).enumerate() {
            info!(
                "Note {}: time={:.3}s lane={} key={}",
                i,
                note.time,
                note.lane,
                keys.get(note.lane).copied().unwrap_or('?')
            );
        }
        return Ok(());
    }

    let mut roster = Roster::new();
    for name in parse_player_names(&args.players) {
        roster.add(&name)?;
    }
    if roster.is_empty() {
        bail!("At least one player is needed..!");
    }

    let config = SessionConfig::from_args(&args);

    match mode {
        InputMode::Autoplay => {
            let auto = AutoPlay::new(&chart, &config.lane_keys, args.autoplay_offset_ms / 1000.0);
            play_round(Driver::new(auto, args.fps, args.verbose), &chart, &config, &mut roster, args.verbose)?;
        }
        InputMode::Keyboard => play_keyboard(&chart, &config, &mut roster, &args)?,
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(roster.competitors())?);
    } else {
        for c in roster.competitors() {
            println!("{:20} {:>8}", c.name, c.score);
        }
    }

    if let Some(winner) = roster.winner() {
        info!("Winner: {} with {} points..!", winner.name, winner.score);
    }

    Ok(())
}

#[cfg(all(target_os = "windows", feature = "wininput"))]
fn play_keyboard(chart: &[ChartNote], config: &SessionConfig, roster: &mut Roster, args: &Args) -> Result<()> {
    let keyboard = melody_rush::KeyboardSource::new(&config.lane_keys);
    play_round(Driver::new(keyboard, args.fps, args.verbose), chart, config, roster, args.verbose)
}

#[cfg(not(all(target_os = "windows", feature = "wininput")))]
fn play_keyboard(_chart: &[ChartNote], _config: &SessionConfig, _roster: &mut Roster, _args: &Args) -> Result<()> {
    bail!("Keyboard input needs Windows and the `wininput` feature, try `--input autoplay`..!")
}

fn play_round<K: KeySource + 'static>(
    driver: Driver<K>,
    chart: &[ChartNote],
    config: &SessionConfig,
    roster: &mut Roster,
    verbose: bool,
) -> Result<()> {
    let driver = Arc::new(driver);
    let driver_for_handler = Arc::clone(&driver);
    let aborted = Arc::new(AtomicBool::new(false));
    let aborted_for_handler = Arc::clone(&aborted);

    ctrlc::set_handler(move || {
        warn!("Ctrl-C received, stopping the game loop..!");
        aborted_for_handler.store(true, Ordering::SeqCst);
        let _ = driver_for_handler.stop();
    })?;

    loop {
        if aborted.load(Ordering::SeqCst) {
            warn!("Round aborted..!");
            return Ok(());
        }

        let Some(player) = roster.active().map(|c| c.name.clone()) else {
            bail!("No active player..!");
        };
        info!("Up next: {}..!", player);

        let session = Session::new(chart, config.clone());
        let mut frames: u64 = 0;
        let aborted_in_turn = Arc::clone(&aborted);
        let on_frame = move |snapshot: &Snapshot| {
            // Ctrl-C may land before the loop can take a stop message.
            if aborted_in_turn.load(Ordering::SeqCst) {
                return FrameControl::Finish;
            }

            frames += 1;
            if verbose && frames % 60 == 0 {
                render_line(snapshot);
            }
            turn_over(snapshot, TURN_TAIL)
        };

        let Some(session) = driver.play(session, on_frame, true)? else {
            bail!("Game loop returned without a session..!");
        };

        roster.record(session.report())?;

        if aborted.load(Ordering::SeqCst) {
            warn!("Round aborted..!");
            return Ok(());
        }

        if !roster.advance() {
            return Ok(());
        }
    }
}

/// Minimal text renderer: phase, clock, score and the next note per lane.
fn render_line(snapshot: &Snapshot) {
    let lanes: Vec<String> = (0..snapshot.lanes_active.len())
        .map(|lane| {
            let next = snapshot
                .notes
                .iter()
                .filter(|n| n.lane() == lane && !n.is_judged())
                .map(|n| n.offset_px(snapshot.time, SCROLL_SPEED_PX_PER_SEC))
                .fold(f64::INFINITY, f64::min);
            let held = if snapshot.lanes_active[lane] { "*" } else { " " };

            if next.is_finite() {
                format!("{}{:>6.0}px", held, next)
            } else {
                format!("{}     --", held)
            }
        })
        .collect();

    info!(
        "{:9} | {:>7.3}s | prep {:>4.1} | count {:>3.1} | score {:>6} | combo {:>3} | {:7} | {}",
        snapshot.phase.to_string(),
        snapshot.time,
        snapshot.prepare_remaining,
        snapshot.countdown_remaining,
        snapshot.score,
        snapshot.combo,
        snapshot.feedback.map(|f| f.judgement.label()).unwrap_or(""),
        lanes.join(" |")
    );
}
