use serde::{Deserialize, Serialize};

use crate::engine::judgement::Judgement;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComboState {
    pub current: u32,
}

/// Per-judgement counts for the turn report.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
    pub max_combo: u32,
}

impl Tally {
    pub fn judged(&self) -> u32 {
        self.perfect + self.good + self.miss
    }
}

/// Score and combo for one session.
///
/// Only the judgement engine writes to it; everyone else gets the getters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBoard {
    score: u64,
    combo: ComboState,
    tally: Tally,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo.current
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Applies a judgement and returns the points it earned.
    pub(crate) fn apply(&mut self, judgement: Judgement) -> u64 {
        let gained = match judgement {
            Judgement::Perfect => {
                self.bump_combo();
                self.tally.perfect += 1;
                100 + u64::from(self.combo.current) * 2
            }
            Judgement::Good => {
                self.bump_combo();
                self.tally.good += 1;
                70 + u64::from(self.combo.current)
            }
            Judgement::Miss => {
                self.combo.current = 0;
                self.tally.miss += 1;
                0
            }
        };

        self.score += gained;
        gained
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    fn bump_combo(&mut self) {
        self.combo.current += 1;
        self.tally.max_combo = self.tally.max_combo.max(self.combo.current);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn perfect_scores_post_increment_combo() {
        let mut board = ScoreBoard::new();

        assert_eq!(board.apply(Judgement::Perfect), 102);
        assert_eq!(board.apply(Judgement::Perfect), 104);
        assert_eq!(board.score(), 206);
        assert_eq!(board.combo(), 2);
    }

    #[test]
    fn good_scores_post_increment_combo() {
        let mut board = ScoreBoard::new();

        assert_eq!(board.apply(Judgement::Good), 71);
        assert_eq!(board.apply(Judgement::Good), 72);
        assert_eq!(board.score(), 143);
    }

    #[test]
    fn miss_resets_combo_keeps_score() {
        let mut board = ScoreBoard::new();
        for _ in 0..5 {
            board.apply(Judgement::Perfect);
        }
        let before = board.score();

        assert_eq!(board.apply(Judgement::Miss), 0);
        assert_eq!(board.combo(), 0);
        assert_eq!(board.score(), before);

        assert_eq!(board.apply(Judgement::Good), 71);

        let tally = board.tally();
        assert_eq!(tally.perfect, 5);
        assert_eq!(tally.good, 1);
        assert_eq!(tally.miss, 1);
        assert_eq!(tally.max_combo, 5);
        assert_eq!(tally.judged(), 7);
    }

    #[test]
    fn reset_clears_everything() {
        let mut board = ScoreBoard::new();
        board.apply(Judgement::Perfect);
        board.reset();

        assert_eq!(board, ScoreBoard::default());
    }
}
