use crate::approximator::ActionValueApproximator;
use crate::board::CELLS;
use crate::config::ExplorationConfig;
use crate::encoding::EncodedState;
use rand::prelude::SliceRandom;
use rand::Rng;

/// Epsilon-greedy action selection with a multiplicative per-episode decay.
#[derive(Clone, Debug)]
pub struct EpsilonGreedy {
    epsilon: f64,
    decay: f64,
    min_epsilon: f64,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f64, decay: f64) -> Self {
        EpsilonGreedy {
            epsilon,
            decay,
            min_epsilon: 0.0,
        }
    }

    pub fn from_config(config: &ExplorationConfig) -> Self {
        EpsilonGreedy {
            epsilon: config.initial_epsilon,
            decay: config.decay,
            min_epsilon: config.min_epsilon,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Called once per completed episode.
    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.decay).max(self.min_epsilon);
    }

    /// Explores uniformly over `legal` cells with probability epsilon,
    /// otherwise returns the approximator's best action.
    ///
    /// The exploit branch ignores `legal`: an occupied cell can come back and
    /// must go through the caller's invalid-move handling. Only cells already
    /// `rejected` during the current turn are skipped, so a turn sees at most
    /// one rejection per occupied cell.
    pub fn select_action<A, R>(
        &self,
        approximator: &A,
        state: &EncodedState,
        legal: &[bool; CELLS],
        rejected: &[bool; CELLS],
        rng: &mut R,
    ) -> usize
    where
        A: ActionValueApproximator + ?Sized,
        R: Rng + ?Sized,
    {
        let open: Vec<usize> = (0..CELLS).filter(|&i| legal[i]).collect();
        if rng.gen::<f64>() < self.epsilon {
            if let Some(&action) = open.choose(rng) {
                return action;
            }
        }
        approximator
            .predict(state)
            .argmax_where(|i| !rejected[i])
            .or_else(|| open.first().copied())
            .unwrap_or(0)
    }

    /// Best legal action, used when playing without exploration.
    pub fn greedy_legal<A>(approximator: &A, state: &EncodedState, legal: &[bool; CELLS]) -> Option<usize>
    where
        A: ActionValueApproximator + ?Sized,
    {
        approximator.predict(state).argmax_where(|i| legal[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approximator::{ActionValues, Weights};
    use crate::board::{Board, Cell};
    use crate::encoding::encode;
    use crate::q_table::QTable;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixed(ActionValues);

    impl ActionValueApproximator for Fixed {
        fn predict(&self, _state: &EncodedState) -> ActionValues {
            self.0
        }
        fn update(&mut self, _state: &EncodedState, _target: &ActionValues) {}
        fn weights(&self) -> Weights {
            Weights::Table(QTable::new(0.0, 0.0))
        }
    }

    fn board_with_center() -> Board {
        let mut board = Board::new();
        board.apply_move(1, 1, Cell::Cross);
        board
    }

    #[test]
    fn decay_is_multiplicative() {
        let mut policy = EpsilonGreedy::new(1.0, 0.9);
        for _ in 0..10 {
            policy.decay();
        }
        assert!((policy.epsilon() - 0.9f64.powi(10)).abs() < 1e-12);
    }

    #[test]
    fn decay_respects_floor() {
        let mut policy = EpsilonGreedy::from_config(&ExplorationConfig {
            initial_epsilon: 0.2,
            decay: 0.5,
            min_epsilon: 0.1,
        });
        policy.decay();
        policy.decay();
        assert_eq!(policy.epsilon(), 0.1);
    }

    #[test]
    fn exploit_returns_occupied_cell_when_ranked_highest() {
        let board = board_with_center();
        let state = encode(&board, true);
        let mut values = ActionValues::splat(0.0);
        values[4] = 9.0;
        let policy = EpsilonGreedy::new(0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        let action = policy.select_action(
            &Fixed(values),
            &state,
            &board.legal_mask(),
            &[false; CELLS],
            &mut rng,
        );
        assert_eq!(action, 4);
    }

    #[test]
    fn exploit_skips_rejected_cells() {
        let board = board_with_center();
        let state = encode(&board, true);
        let mut values = ActionValues::splat(0.0);
        values[4] = 9.0;
        values[7] = 3.0;
        let mut rejected = [false; CELLS];
        rejected[4] = true;
        let policy = EpsilonGreedy::new(0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        let action =
            policy.select_action(&Fixed(values), &state, &board.legal_mask(), &rejected, &mut rng);
        assert_eq!(action, 7);
    }

    #[test]
    fn explore_only_picks_legal_cells() {
        let board = board_with_center();
        let state = encode(&board, true);
        let policy = EpsilonGreedy::new(1.0, 1.0);
        let mut rng = StdRng::seed_from_u64(42);
        let legal = board.legal_mask();
        for _ in 0..200 {
            let action =
                policy.select_action(&Fixed(ActionValues::splat(0.0)), &state, &legal, &[false; CELLS], &mut rng);
            assert!(legal[action]);
        }
    }

    #[test]
    fn greedy_legal_masks_occupied_cells() {
        let board = board_with_center();
        let state = encode(&board, true);
        let mut values = ActionValues::splat(0.0);
        values[4] = 9.0;
        values[8] = 1.0;
        assert_eq!(
            EpsilonGreedy::greedy_legal(&Fixed(values), &state, &board.legal_mask()),
            Some(8)
        );
    }
}
