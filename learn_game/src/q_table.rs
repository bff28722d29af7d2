use crate::approximator::{ActionValueApproximator, ActionValues, Weights};
use crate::encoding::EncodedState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Tabular approximator keyed by the encoded board.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QTable {
    qtable: HashMap<String, ActionValues>,
    learning_rate: f32,
    initial_value: f32,
}

impl Deref for QTable {
    type Target = HashMap<String, ActionValues>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.qtable
    }
}

impl DerefMut for QTable {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.qtable
    }
}

impl QTable {
    pub fn new(learning_rate: f32, initial_value: f32) -> Self {
        QTable {
            // reachable positions from the Learner's seat stay well under this
            qtable: HashMap::with_capacity(6000),
            learning_rate,
            initial_value,
        }
    }
}

impl ActionValueApproximator for QTable {
    fn predict(&self, state: &EncodedState) -> ActionValues {
        self.get(&state.key())
            .copied()
            .unwrap_or_else(|| ActionValues::splat(self.initial_value))
    }

    fn update(&mut self, state: &EncodedState, target: &ActionValues) {
        let lrate = self.learning_rate;
        let initial = self.initial_value;
        let values = self
            .entry(state.key())
            .or_insert_with(|| ActionValues::splat(initial));
        for (value, goal) in values.0.iter_mut().zip(target.iter()) {
            *value *= 1.0 - lrate;
            *value += lrate * goal;
        }
    }

    fn weights(&self) -> Weights {
        Weights::Table(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Cell};
    use crate::encoding::encode;

    #[test]
    fn unseen_state_predicts_initial_value() {
        let q = QTable::new(0.1, 0.25);
        let state = encode(&Board::new(), true);
        assert_eq!(q.predict(&state), ActionValues::splat(0.25));
        assert!(q.is_empty());
    }

    #[test]
    fn update_moves_only_the_target_action() {
        let mut q = QTable::new(0.5, 0.0);
        let mut board = Board::new();
        board.apply_move(1, 1, Cell::Cross);
        let state = encode(&board, true);
        let target = q.predict(&state).with_target(2, 10.0);
        q.update(&state, &target);
        let after = q.predict(&state);
        assert_eq!(after[2], 5.0);
        for i in (0..9).filter(|&i| i != 2) {
            assert_eq!(after[i], 0.0);
        }
        q.update(&state, &after.with_target(2, 10.0));
        assert_eq!(q.predict(&state)[2], 7.5);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn states_are_kept_apart() {
        let mut q = QTable::new(1.0, 0.0);
        let empty = encode(&Board::new(), true);
        let mut board = Board::new();
        board.apply_move(0, 0, Cell::Nought);
        let other = encode(&board, true);
        q.update(&empty, &ActionValues::splat(1.0));
        assert_eq!(q.predict(&empty), ActionValues::splat(1.0));
        assert_eq!(q.predict(&other), ActionValues::splat(0.0));
    }
}
