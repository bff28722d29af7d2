use crate::board::{Board, Cell, CELLS};
use ndarray::prelude::*;
use std::fmt;

pub const EMPTY_CODE: f32 = 0.0;
pub const CROSS_CODE: f32 = 1.0;
pub const NOUGHT_CODE: f32 = 2.0;

/// Board cell codes as seen from the Learner's seat.
///
/// Learner-owned cells always carry [`CROSS_CODE`], whichever side moved
/// first, so a single value function covers both seat orders.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedState {
    pub codes: Array1<f32>,
}

/// Encodes `board` for the approximator. When the Learner moved second its
/// Nought cells are swapped with the opponent's Cross cells.
pub fn encode(board: &Board, learner_started_first: bool) -> EncodedState {
    let codes = board
        .iter()
        .map(|cell| match (cell, learner_started_first) {
            (Cell::Empty, _) => EMPTY_CODE,
            (Cell::Cross, true) | (Cell::Nought, false) => CROSS_CODE,
            (Cell::Nought, true) | (Cell::Cross, false) => NOUGHT_CODE,
        })
        .collect::<Array1<f32>>();
    EncodedState { codes }
}

impl EncodedState {
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Nine-digit key, one code per cell.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EncodedState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for code in self.codes.iter() {
            write!(f, "{}", *code as u8)?;
        }
        Ok(())
    }
}

impl Default for EncodedState {
    fn default() -> Self {
        EncodedState {
            codes: Array1::zeros(CELLS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{to_row_col, GameState, Side};
    use ndarray::array;

    fn play(game: &mut GameState, moves: &[(usize, Side)]) {
        for &(index, side) in moves {
            let (row, col) = to_row_col(index);
            assert!(game.apply_move(row, col, side));
        }
    }

    #[test]
    fn identity_when_learner_started() {
        let mut game = GameState::new(Side::Learner);
        play(&mut game, &[(0, Side::Learner), (4, Side::PlayerOne), (8, Side::Learner)]);
        let encoded = encode(&game.board, game.learner_started_first());
        assert_eq!(encoded.codes, array![1., 0., 0., 0., 2., 0., 0., 0., 1.]);
        assert_eq!(encoded.key(), "100020001");
    }

    #[test]
    fn swapped_when_learner_moved_second() {
        let mut game = GameState::new(Side::PlayerOne);
        play(&mut game, &[(0, Side::PlayerOne), (4, Side::Learner), (8, Side::PlayerOne)]);
        assert_eq!(game.board.at(0), Cell::Cross);
        assert_eq!(game.board.at(4), Cell::Nought);
        let encoded = encode(&game.board, game.learner_started_first());
        assert_eq!(encoded.codes, array![2., 0., 0., 0., 1., 0., 0., 0., 2.]);
    }

    #[test]
    fn learner_code_is_seat_independent() {
        let mut first = GameState::new(Side::Learner);
        play(&mut first, &[(3, Side::Learner), (5, Side::PlayerOne)]);
        let mut second = GameState::new(Side::PlayerOne);
        play(&mut second, &[(5, Side::PlayerOne), (3, Side::Learner)]);
        assert_eq!(
            encode(&first.board, first.learner_started_first()),
            encode(&second.board, second.learner_started_first())
        );
    }

    #[test]
    fn empty_board_encodes_to_zeros() {
        let encoded = encode(&Board::new(), false);
        assert_eq!(encoded.len(), CELLS);
        assert_eq!(encoded, EncodedState::default());
    }
}
