use crate::board::Outcome;
use serde::{Deserialize, Serialize};

/// Outcome counters for the current reporting interval.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TrainingStatistics {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

/// Per-interval snapshots of [`TrainingStatistics`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub interval: usize,
    pub wins: Vec<u32>,
    pub losses: Vec<u32>,
    pub draws: Vec<u32>,
}

impl TrainingStatistics {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.draws
    }
}

impl TrainingHistory {
    pub fn new(interval: usize) -> Self {
        TrainingHistory {
            interval,
            ..Default::default()
        }
    }

    /// Appends the counters and resets them.
    pub fn snapshot(&mut self, stats: &mut TrainingStatistics) {
        self.wins.push(stats.wins);
        self.losses.push(stats.losses);
        self.draws.push(stats.draws);
        *stats = TrainingStatistics::default();
    }

    pub fn len(&self) -> usize {
        self.wins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wins.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (usize, TrainingStatistics)> + '_ {
        self.wins
            .iter()
            .zip(&self.losses)
            .zip(&self.draws)
            .enumerate()
            .map(|(i, ((&wins, &losses), &draws))| (i, TrainingStatistics { wins, losses, draws }))
    }
}
