use crate::board::CELLS;
use crate::encoding::EncodedState;
use crate::network::NetworkWeights;
use crate::q_table::QTable;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Predicted return of placing at each cell, row-major.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionValues(pub [f32; CELLS]);

/// Serializable parameters of an approximator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Weights {
    Table(QTable),
    Network(NetworkWeights),
}

/// Maps an encoded board to nine action-values and learns online.
pub trait ActionValueApproximator {
    fn predict(&self, state: &EncodedState) -> ActionValues;
    /// One online step moving `predict(state)` toward `target`.
    fn update(&mut self, state: &EncodedState, target: &ActionValues);
    fn weights(&self) -> Weights;
}

impl<T: ActionValueApproximator + ?Sized> ActionValueApproximator for Box<T> {
    fn predict(&self, state: &EncodedState) -> ActionValues {
        (**self).predict(state)
    }

    fn update(&mut self, state: &EncodedState, target: &ActionValues) {
        (**self).update(state, target)
    }

    fn weights(&self) -> Weights {
        (**self).weights()
    }
}

impl ActionValues {
    pub fn splat(value: f32) -> Self {
        ActionValues([value; CELLS])
    }

    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.0.iter()
    }

    pub fn max(&self) -> f32 {
        self.0.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Highest-valued action, lowest index on ties.
    pub fn argmax(&self) -> usize {
        self.argmax_where(|_| true).unwrap_or(0)
    }

    /// Highest-valued action among those `allowed`, lowest index on ties.
    pub fn argmax_where<F>(&self, allowed: F) -> Option<usize>
    where
        F: Fn(usize) -> bool,
    {
        self.0
            .iter()
            .enumerate()
            .filter(|(i, _)| allowed(*i))
            .min_by(|(_, a), (_, b)| b.total_cmp(a))
            .map(|(i, _)| i)
    }

    /// Copy of `self` with `action` overwritten, the update target for one step.
    pub fn with_target(&self, action: usize, target: f32) -> Self {
        let mut values = *self;
        values[action] = target;
        values
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

impl Index<usize> for ActionValues {
    type Output = f32;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for ActionValues {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl FromIterator<f32> for ActionValues {
    fn from_iter<I: IntoIterator<Item = f32>>(iter: I) -> Self {
        let mut values = [0.0; CELLS];
        for (slot, value) in values.iter_mut().zip(iter) {
            *slot = value;
        }
        ActionValues(values)
    }
}

/// One-step Q-learning target. `next` is `None` once the episode is done.
pub fn td_target(reward: f32, gamma: f32, next: Option<&ActionValues>) -> f32 {
    match next {
        Some(values) => reward + gamma * values.max(),
        None => reward,
    }
}

/// Renders values as a compact row-major grid for logs.
pub fn format_values(values: &ActionValues) -> String {
    values
        .0
        .chunks(3)
        .map(|row| row.iter().map(|v| format!("{v:8.2}")).join(""))
        .join(" |")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_breaks_ties_by_lowest_index() {
        let values = ActionValues([0.0, 3.0, 1.0, 3.0, 0.0, 0.0, 3.0, 0.0, 0.0]);
        assert_eq!(values.argmax(), 1);
        assert_eq!(values.argmax_where(|i| i != 1), Some(3));
        assert_eq!(values.argmax_where(|_| false), None);
        assert_eq!(ActionValues::splat(0.5).argmax(), 0);
    }

    #[test]
    fn td_target_bootstraps_only_when_not_done() {
        let next = ActionValues([0.0, 4.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
        assert_eq!(td_target(1.0, 0.5, Some(&next)), 3.0);
        assert_eq!(td_target(1.0, 0.5, None), 1.0);
    }

    #[test]
    fn target_vector_only_touches_taken_action() {
        let current = ActionValues([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let target = current.with_target(4, -20.0);
        for i in 0..CELLS {
            if i == 4 {
                assert_eq!(target[i], -20.0);
            } else {
                assert_eq!(target[i], current[i]);
            }
        }
    }

    #[test]
    fn formats_three_rows() {
        let text = format_values(&ActionValues::splat(1.0));
        assert_eq!(text.matches('|').count(), 2);
    }
}
