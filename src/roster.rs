use anyhow::bail;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::driver::FrameControl;
use crate::engine::{Snapshot, TurnReport};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Competitor {
    pub id: usize,
    pub name: String,
    pub score: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_turn: Option<TurnReport>,
}

/// Players taking turns on the same song, one turn each per round.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Roster {
    competitors: Vec<Competitor>,
    active: Option<usize>,
    played_this_round: usize,
    round_finished: bool,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player; the first one added becomes active.
    pub fn add(&mut self, name: &str) -> anyhow::Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Player name must not be empty..!");
        }

        let id = self.competitors.len();
        self.competitors.push(Competitor {
            id,
            name: name.to_owned(),
            score: 0,
            last_turn: None,
        });

        if self.active.is_none() {
            self.active = Some(id);
        }

        debug!("Added player '{}' (#{})", name, id);
        Ok(id)
    }

    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }

    pub fn active(&self) -> Option<&Competitor> {
        self.active.and_then(|id| self.competitors.get(id))
    }

    pub fn select(&mut self, id: usize) -> anyhow::Result<()> {
        if id >= self.competitors.len() {
            bail!("No player with id {}..!", id);
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn round_finished(&self) -> bool {
        self.round_finished
    }

    /// Books a finished turn on the active player.
    pub fn record(&mut self, report: TurnReport) -> anyhow::Result<()> {
        let Some(player) = self.active.and_then(|id| self.competitors.get_mut(id)) else {
            bail!("No active player to record a score for..!");
        };

        player.score = report.score;
        player.last_turn = Some(report);
        info!("'{}' scored {}..!", player.name, report.score);
        Ok(())
    }

    /// Hands the turn to the next player. Returns `false` once everyone has
    /// played this round.
    pub fn advance(&mut self) -> bool {
        let Some(active) = self.active else {
            return false;
        };

        self.played_this_round += 1;
        if self.played_this_round >= self.competitors.len() {
            self.round_finished = true;
            self.played_this_round = 0;
            info!("Round finished..!");
            return false;
        }

        let next = (active + 1) % self.competitors.len();
        self.active = Some(next);
        true
    }

    /// Highest score wins; on a tie the earlier player keeps the lead.
    pub fn winner(&self) -> Option<&Competitor> {
        self.competitors
            .iter()
            .fold(None, |best: Option<&Competitor>, cur| match best {
                Some(b) if b.score >= cur.score => Some(b),
                _ => Some(cur),
            })
    }

    /// New game: every score goes back to zero and the first player is up.
    pub fn restart(&mut self) {
        for c in self.competitors.iter_mut() {
            c.score = 0;
            c.last_turn = None;
        }
        self.active = if self.competitors.is_empty() { None } else { Some(0) };
        self.played_this_round = 0;
        self.round_finished = false;
    }
}

/// Ends a turn once every note is judged and `tail` seconds have passed the last one.
pub fn turn_over(snapshot: &Snapshot, tail: f64) -> FrameControl {
    if snapshot.chart_complete() && snapshot.time >= snapshot.last_note_time() + tail {
        FrameControl::Finish
    } else {
        FrameControl::Continue
    }
}
