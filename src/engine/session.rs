use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::engine::clock::{ClockPhase, GameClock, PhaseError, sanitize};
use crate::engine::judgement::{Hit, Judgement, RuntimeNote, find_candidate, judge, mark_late_misses};
use crate::engine::score::{ScoreBoard, Tally};
use crate::model::config::SessionConfig;
use crate::model::song::ChartNote;

/// Judgement text shown to the player, fading out over `remaining` seconds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Feedback {
    pub judgement: Judgement,
    pub remaining: f64,
}

/// Everything a renderer needs for one frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub time: f64,
    pub phase: ClockPhase,
    pub prepare_remaining: f64,
    pub countdown_remaining: f64,
    pub notes: Vec<RuntimeNote>,
    pub score: u64,
    pub combo: u32,
    pub feedback: Option<Feedback>,
    pub lanes_active: Vec<bool>,
}

impl Snapshot {
    pub fn judged(&self) -> usize {
        self.notes.iter().filter(|n| n.is_judged()).count()
    }

    pub fn chart_complete(&self) -> bool {
        all_judged(&self.notes)
    }

    pub fn last_note_time(&self) -> f64 {
        self.notes.iter().map(|n| n.time()).fold(0.0, f64::max)
    }
}

/// What the session manager gets back once a turn is over.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TurnReport {
    pub score: u64,
    pub tally: Tally,
    pub notes: usize,
    pub play_time: f64,
}

/// One play-through of a chart: notes, clock and score, owned by the frame loop.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    notes: Vec<RuntimeNote>,
    clock: GameClock,
    board: ScoreBoard,
    feedback: Option<Feedback>,
}

impl Session {
    pub fn new(chart: &[ChartNote], config: SessionConfig) -> Self {
        let clock = GameClock::new(config.prepare_duration, config.countdown_duration);

        Self {
            notes: chart.iter().copied().map(RuntimeNote::new).collect(),
            clock,
            board: ScoreBoard::new(),
            feedback: None,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn notes(&self) -> &[RuntimeNote] {
        &self.notes
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn phase(&self) -> ClockPhase {
        self.clock.phase()
    }

    pub fn board(&self) -> &ScoreBoard {
        &self.board
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    pub fn lane_count(&self) -> usize {
        self.config.lane_keys.len()
    }

    /// Starts the prepare phase. From `finished` this is a restart: every note
    /// goes back to unjudged and score and combo return to zero.
    pub fn start(&mut self) -> Result<(), PhaseError> {
        self.clock.start()?;

        for n in self.notes.iter_mut() {
            *n = RuntimeNote::new(n.note);
        }
        self.board.reset();
        self.feedback = None;

        info!("Session started with {} notes..!", self.notes.len());
        Ok(())
    }

    /// Ends the turn on behalf of the session manager.
    pub fn finish(&mut self) -> Result<TurnReport, PhaseError> {
        self.clock.finish()?;
        let report = self.report();

        info!(
            "Session finished | score {} | {} perfect, {} good, {} miss..!",
            report.score, report.tally.perfect, report.tally.good, report.tally.miss
        );
        Ok(report)
    }

    /// Advances one frame by `dt` seconds.
    ///
    /// Play time moves first. The feedback shown so far fades before lapsed
    /// notes become misses, so a miss label set here survives this frame.
    /// Hit flashes decay next and the prepare and countdown timers run last.
    pub fn update(&mut self, dt: f64) {
        let dt = sanitize(dt);
        let now = self.clock.advance(dt);

        if let Some(feedback) = self.feedback.as_mut() {
            feedback.remaining = (feedback.remaining - dt).max(0.0);
            if feedback.remaining <= 0.0 {
                self.feedback = None;
            }
        }

        if self.clock.is_running() {
            let missed = mark_late_misses(&mut self.notes, now, &self.config.windows, &mut self.board);
            if missed > 0 {
                self.show_feedback(Judgement::Miss);
            }
        }

        for n in self.notes.iter_mut().filter(|n| n.hit_flash > 0.0) {
            n.hit_flash = (n.hit_flash - dt).max(0.0);
        }

        if let Some(phase) = self.clock.tick_phase(dt) {
            debug!("Session entered {}", phase);
        }
    }

    /// Judges a press on `lane` at the current play time.
    ///
    /// Presses outside of `running`, on lanes that do not exist, or with no
    /// note in reach are dropped without touching the score.
    pub fn press(&mut self, lane: usize) -> Option<Hit> {
        if lane >= self.lane_count() || !self.clock.is_running() {
            return None;
        }

        let now = self.clock.time();
        let idx = find_candidate(&self.notes, lane, now, &self.config.windows)?;
        let hit = judge(&mut self.notes[idx], now, &self.config, &mut self.board)?;

        self.show_feedback(hit.judgement);
        Some(hit)
    }

    pub fn chart_complete(&self) -> bool {
        all_judged(&self.notes)
    }

    pub fn snapshot(&self, lanes_active: &[bool]) -> Snapshot {
        Snapshot {
            time: self.clock.time(),
            phase: self.clock.phase(),
            prepare_remaining: self.clock.prepare_remaining(),
            countdown_remaining: self.clock.countdown_remaining(),
            notes: self.notes.clone(),
            score: self.board.score(),
            combo: self.board.combo(),
            feedback: self.feedback,
            lanes_active: lanes_active.to_vec(),
        }
    }

    pub fn report(&self) -> TurnReport {
        TurnReport {
            score: self.board.score(),
            tally: self.board.tally(),
            notes: self.notes.len(),
            play_time: self.clock.time(),
        }
    }

    fn show_feedback(&mut self, judgement: Judgement) {
        self.feedback = Some(Feedback {
            judgement,
            remaining: self.config.feedback_duration,
        });
    }
}

fn all_judged(notes: &[RuntimeNote]) -> bool {
    notes.iter().all(|n| n.is_judged())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chart::build_chart;
    use crate::model::song::SongDescriptor;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn four_note_session() -> Session {
        four_note_session_with_lead_in(2.0)
    }

    fn four_note_session_with_lead_in(lead_in: f64) -> Session {
        let song = SongDescriptor::new("four", "Four", 120.0, 4, lead_in, &[0, 1, 2, 3]);
        Session::new(&build_chart(&song).unwrap(), SessionConfig::default())
    }

    fn running_session() -> Session {
        run_up(four_note_session())
    }

    /// Drives a fresh session through prepare and countdown.
    fn run_up(mut session: Session) -> Session {
        session.start().unwrap();
        session.update(0.0);
        session.update(5.0);
        assert_eq!(session.phase(), ClockPhase::Countdown);
        session.update(3.0);
        assert_eq!(session.phase(), ClockPhase::Running);
        assert_eq!(session.clock().time(), 0.0);
        session
    }

    #[test]
    fn scripted_turn() {
        env_logger::try_init().unwrap_or(());

        let mut session = running_session();

        session.update(2.03);
        let hit = session.press(0).unwrap();
        assert_eq!(hit.judgement, Judgement::Perfect);
        assert_eq!(session.board().score(), 102);
        assert_eq!(session.board().combo(), 1);

        session.update(0.59);
        assert!(approx_eq(session.clock().time(), 2.62));
        let hit = session.press(1).unwrap();
        assert_eq!(hit.judgement, Judgement::Good);
        assert_eq!(hit.gained, 72);
        assert_eq!(session.board().score(), 174);
        assert_eq!(session.board().combo(), 2);

        session.update(0.57);
        assert!(approx_eq(session.clock().time(), 3.19));
        assert_eq!(session.notes()[2].judgement, Some(Judgement::Miss));
        assert_eq!(session.notes()[3].judgement, None);
        assert_eq!(session.board().combo(), 0);
        assert_eq!(session.board().score(), 174);
        assert_eq!(session.feedback().map(|f| f.judgement), Some(Judgement::Miss));
    }

    #[test]
    fn late_miss_feedback_survives_long_frame() {
        let mut session = running_session();
        session.update(2.0);
        session.press(0).unwrap();

        // One frame longer than the feedback lifetime lapses note 1.
        session.update(0.9);
        assert_eq!(session.notes()[1].judgement, Some(Judgement::Miss));

        let feedback = session.feedback().unwrap();
        assert_eq!(feedback.judgement, Judgement::Miss);
        assert_eq!(feedback.remaining, session.config().feedback_duration);
        assert_eq!(
            session.snapshot(&[false; 4]).feedback.map(|f| f.judgement),
            Some(Judgement::Miss)
        );
    }

    #[test]
    fn late_band_press_is_a_miss() {
        let mut session = running_session();
        session.update(2.0);
        session.press(0).unwrap();
        assert_eq!(session.board().combo(), 1);

        // Note 1 sits at 2.5s, 0.16s past it is inside the late band.
        session.update(0.66);
        let hit = session.press(1).unwrap();
        assert_eq!(hit.judgement, Judgement::Miss);
        assert_eq!(hit.gained, 0);
        assert_eq!(session.notes()[1].judgement, Some(Judgement::Miss));
        assert_eq!(session.board().combo(), 0);
        assert_eq!(session.board().score(), 102);
        assert_eq!(session.feedback().map(|f| f.judgement), Some(Judgement::Miss));
    }

    #[test]
    fn late_window_edge() {
        // First note at 0.0s so play time lands on the window edge exactly.
        let mut session = run_up(four_note_session_with_lead_in(0.0));
        session.update(0.18);
        assert!(!session.notes()[0].is_judged());
        let hit = session.press(0).unwrap();
        assert_eq!(hit.judgement, Judgement::Miss);
        assert_eq!(session.board().tally().miss, 1);

        let mut session = run_up(four_note_session_with_lead_in(0.0));
        session.update(0.181);
        assert_eq!(session.notes()[0].judgement, Some(Judgement::Miss));
        assert_eq!(session.press(0), None);
        assert_eq!(session.board().tally().miss, 1);
        assert_eq!(session.board().score(), 0);
    }

    #[test]
    fn presses_ignored_until_running() {
        let mut session = four_note_session();
        assert_eq!(session.press(0), None);

        session.start().unwrap();
        session.update(4.0);
        assert_eq!(session.press(0), None);
        assert_eq!(session.board().score(), 0);
        assert!(session.notes().iter().all(|n| !n.is_judged()));
    }

    #[test]
    fn clock_frozen_while_not_running() {
        let mut session = four_note_session();
        session.start().unwrap();

        session.update(1.0);
        session.update(2.0);
        assert_eq!(session.clock().time(), 0.0);
        assert_eq!(session.phase(), ClockPhase::Preparing);

        // Even a huge frame before running must not miss anything.
        session.update(100.0);
        assert!(session.notes().iter().all(|n| !n.is_judged()));
    }

    #[test]
    fn out_of_range_lane_and_empty_press() {
        let mut session = running_session();
        session.update(2.0);

        assert_eq!(session.press(7), None);
        assert_eq!(session.press(3), None);
        assert_eq!(session.board().score(), 0);
        assert!(session.feedback().is_none());
    }

    #[test]
    fn late_miss_happens_once() {
        let mut session = running_session();
        session.update(2.0);
        session.press(0).unwrap();

        session.update(1.0);
        assert_eq!(session.notes()[1].judgement, Some(Judgement::Miss));
        assert_eq!(session.board().tally().miss, 1);

        session.update(0.1);
        session.update(0.1);
        assert_eq!(session.board().tally().miss, 2);
        assert_eq!(session.notes()[2].judgement, Some(Judgement::Miss));
    }

    #[test]
    fn flash_and_feedback_decay() {
        let mut session = running_session();
        session.update(2.0);
        session.press(0).unwrap();
        assert_eq!(session.notes()[0].hit_flash, 0.25);

        session.update(0.1);
        assert!(approx_eq(session.notes()[0].hit_flash, 0.15));
        session.update(0.2);
        assert_eq!(session.notes()[0].hit_flash, 0.0);

        session.update(0.3);
        assert!(session.feedback().is_none());
    }

    #[test]
    fn restart_resets_everything() {
        let mut session = running_session();
        session.update(2.0);
        session.press(0).unwrap();
        session.update(5.0);
        assert!(session.chart_complete());

        let report = session.finish().unwrap();
        assert_eq!(report.score, 102);
        assert_eq!(report.tally.miss, 3);
        assert_eq!(report.notes, 4);

        session.start().unwrap();
        assert_eq!(session.phase(), ClockPhase::Preparing);
        assert_eq!(session.board().score(), 0);
        assert_eq!(session.board().combo(), 0);
        assert!(session.notes().iter().all(|n| !n.is_judged() && n.hit_flash == 0.0));
        assert_eq!(session.clock().time(), 0.0);
    }

    #[test]
    fn snapshot_mirrors_state() {
        let mut session = running_session();
        session.update(2.0);
        session.press(0).unwrap();

        let snapshot = session.snapshot(&[true, false, false, false]);
        assert_eq!(snapshot.phase, ClockPhase::Running);
        assert_eq!(snapshot.score, 102);
        assert_eq!(snapshot.combo, 1);
        assert_eq!(snapshot.judged(), 1);
        assert!(!snapshot.chart_complete());
        assert_eq!(snapshot.lanes_active, vec![true, false, false, false]);
        assert!(approx_eq(snapshot.last_note_time(), 3.5));
        assert_eq!(snapshot.feedback.map(|f| f.judgement), Some(Judgement::Perfect));
    }
}
