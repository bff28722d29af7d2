use crate::board::{Board, Cell, Outcome, LINES};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub valid_move: f32,
    pub invalid_move: f32,
    pub win: f32,
    pub lose: f32,
    pub draw: f32,
    pub two_in_row: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            valid_move: 1.0,
            invalid_move: -20.0,
            win: 100.0,
            lose: -100.0,
            draw: 50.0,
            two_in_row: 5.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RewardShaper {
    config: RewardConfig,
}

impl RewardShaper {
    pub fn new(config: RewardConfig) -> Self {
        RewardShaper { config }
    }

    /// Reward for one Learner move attempt.
    ///
    /// `board` is the position after the attempt and `outcome` is set when
    /// the move finished the game. Shaping only applies to games that go on.
    pub fn score(&self, valid: bool, outcome: Option<Outcome>, board: &Board, learner: Cell) -> f32 {
        let mut reward = if valid {
            self.config.valid_move
        } else {
            self.config.invalid_move
        };
        match outcome {
            Some(outcome) => reward += self.terminal(outcome),
            None => reward += self.config.two_in_row * open_pairs(board, learner) as f32,
        }
        reward
    }

    /// Reward for a rejected attempt: the invalid penalty alone. The
    /// open-pair shaping that `score(false, None, ..)` adds is not applied.
    pub fn score_invalid(&self) -> f32 {
        self.config.invalid_move
    }

    /// Terminal reward charged to the Learner's last move when the opponent's
    /// reply ends the game.
    pub fn score_opponent_finish(&self, outcome: Outcome) -> f32 {
        self.terminal(outcome)
    }

    fn terminal(&self, outcome: Outcome) -> f32 {
        match outcome {
            Outcome::Win => self.config.win,
            Outcome::Loss => self.config.lose,
            Outcome::Draw => self.config.draw,
        }
    }
}

/// Lines with exactly two `mark` cells and one empty cell.
pub fn open_pairs(board: &Board, mark: Cell) -> usize {
    LINES
        .iter()
        .filter(|line| {
            let owned = line.iter().filter(|&&i| board.at(i) == mark).count();
            let empty = line.iter().filter(|&&i| board.at(i) == Cell::Empty).count();
            owned == 2 && empty == 1
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::to_row_col;

    fn place(board: &mut Board, cells: &[usize], mark: Cell) {
        for &i in cells {
            let (row, col) = to_row_col(i);
            assert!(board.apply_move(row, col, mark));
        }
    }

    #[test]
    fn valid_move_without_pairs_gets_base_reward() {
        let shaper = RewardShaper::default();
        let mut board = Board::new();
        place(&mut board, &[4], Cell::Cross);
        assert_eq!(shaper.score(true, None, &board, Cell::Cross), 1.0);
    }

    #[test]
    fn invalid_attempt_is_penalised() {
        let shaper = RewardShaper::default();
        assert_eq!(shaper.score(false, None, &Board::new(), Cell::Cross), -20.0);
        assert_eq!(shaper.score_invalid(), -20.0);
    }

    #[test]
    fn rejected_attempt_skips_shaping() {
        let shaper = RewardShaper::default();
        let mut board = Board::new();
        place(&mut board, &[0, 1], Cell::Cross);
        assert_eq!(shaper.score(false, None, &board, Cell::Cross), -20.0 + 5.0);
        assert_eq!(shaper.score_invalid(), -20.0);
    }

    #[test]
    fn shaping_stacks_per_open_line() {
        let shaper = RewardShaper::default();
        let mut board = Board::new();
        // X at 0, 1 and 3: open pairs on the top row and the left column
        place(&mut board, &[0, 1, 3], Cell::Cross);
        place(&mut board, &[8], Cell::Nought);
        assert_eq!(open_pairs(&board, Cell::Cross), 2);
        assert_eq!(shaper.score(true, None, &board, Cell::Cross), 1.0 + 2.0 * 5.0);
    }

    #[test]
    fn blocked_pair_does_not_count() {
        let mut board = Board::new();
        place(&mut board, &[0, 1], Cell::Nought);
        place(&mut board, &[2], Cell::Cross);
        assert_eq!(open_pairs(&board, Cell::Nought), 0);
    }

    #[test]
    fn terminal_rewards_replace_shaping() {
        let shaper = RewardShaper::default();
        let mut board = Board::new();
        place(&mut board, &[0, 1, 2, 3], Cell::Cross);
        assert_eq!(shaper.score(true, Some(Outcome::Win), &board, Cell::Cross), 101.0);
        assert_eq!(shaper.score(true, Some(Outcome::Draw), &board, Cell::Cross), 51.0);
        assert_eq!(shaper.score_opponent_finish(Outcome::Loss), -100.0);
    }
}
