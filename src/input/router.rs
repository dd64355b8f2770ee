use log::debug;

use crate::engine::{Hit, Session};
use crate::input::KeyEvent;

/// Resolves keys to lanes and forwards lane presses to the session.
#[derive(Debug, Clone)]
pub struct InputRouter {
    keys: Vec<char>,
    active: Vec<bool>,
}

impl InputRouter {
    pub fn new(keys: &[char]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_ascii_lowercase()).collect(),
            active: vec![false; keys.len()],
        }
    }

    pub fn lane_for(&self, key: char) -> Option<usize> {
        let key = key.to_ascii_lowercase();
        self.keys.iter().position(|&k| k == key)
    }

    pub fn key_for(&self, lane: usize) -> Option<char> {
        self.keys.get(lane).copied()
    }

    /// Held state per lane, for display only.
    pub fn lanes_active(&self) -> &[bool] {
        &self.active
    }

    pub fn handle(&mut self, event: KeyEvent, session: &mut Session) -> Option<Hit> {
        match event {
            KeyEvent::Down(key) => self.key_down(key, session),
            KeyEvent::Up(key) => {
                self.key_up(key);
                None
            }
        }
    }

    /// Marks the lane held and, while the session is running, judges the press.
    pub fn key_down(&mut self, key: char, session: &mut Session) -> Option<Hit> {
        let Some(lane) = self.lane_for(key) else {
            debug!("Ignoring unmapped key '{}'", key);
            return None;
        };

        self.active[lane] = true;
        session.press(lane)
    }

    pub fn key_up(&mut self, key: char) {
        if let Some(lane) = self.lane_for(key) {
            self.active[lane] = false;
        }
    }

    pub fn release_all(&mut self) {
        self.active.iter_mut().for_each(|a| *a = false);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chart::build_chart;
    use crate::engine::{ClockPhase, Judgement};
    use crate::model::config::{LANE_KEYS, SessionConfig};
    use crate::model::song::SongDescriptor;

    fn started_session(prepare: f64) -> Session {
        let song = SongDescriptor::new("route", "Route", 60.0, 4, 1.0, &[0, 1, 2, 3]);
        let config = SessionConfig {
            prepare_duration: prepare,
            countdown_duration: 0.0,
            ..SessionConfig::default()
        };
        let mut session = Session::new(&build_chart(&song).unwrap(), config);
        session.start().unwrap();
        session
    }

    #[test]
    fn maps_keys_case_insensitively() {
        let router = InputRouter::new(&LANE_KEYS);

        assert_eq!(router.lane_for('a'), Some(0));
        assert_eq!(router.lane_for('S'), Some(1));
        assert_eq!(router.lane_for('f'), Some(3));
        assert_eq!(router.lane_for('j'), None);
        assert_eq!(router.key_for(2), Some('d'));
        assert_eq!(router.key_for(4), None);
    }

    #[test]
    fn presses_judged_only_while_running() {
        env_logger::try_init().unwrap_or(());

        let mut router = InputRouter::new(&LANE_KEYS);
        let mut session = started_session(1.0);

        assert_eq!(router.key_down('a', &mut session), None);
        assert_eq!(router.lanes_active(), &[true, false, false, false]);
        router.key_up('a');
        assert_eq!(router.lanes_active(), &[false; 4]);

        session.update(1.0);
        session.update(0.0);
        assert_eq!(session.phase(), ClockPhase::Running);
        session.update(1.0);

        let hit = router.handle(KeyEvent::Down('A'), &mut session).unwrap();
        assert_eq!(hit.judgement, Judgement::Perfect);
        assert_eq!(router.handle(KeyEvent::Up('a'), &mut session), None);
        assert!(!router.lanes_active()[0]);
    }

    #[test]
    fn unmapped_keys_do_nothing() {
        let mut router = InputRouter::new(&LANE_KEYS);
        let mut session = started_session(0.0);
        session.update(0.0);
        session.update(0.0);
        session.update(1.0);

        assert_eq!(router.key_down('q', &mut session), None);
        router.key_up('q');
        assert_eq!(router.lanes_active(), &[false; 4]);
        assert_eq!(session.board().score(), 0);
    }

    #[test]
    fn release_all_clears_held_lanes() {
        let mut router = InputRouter::new(&LANE_KEYS);
        let mut session = started_session(1.0);
        router.key_down('s', &mut session);
        router.key_down('d', &mut session);

        router.release_all();
        assert_eq!(router.lanes_active(), &[false; 4]);
    }
}
