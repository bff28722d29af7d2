use crate::board::{to_row_col, Board, Cell};
use crate::error::InputError;
use rand::prelude::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const WIN_SCORE: i32 = 10;

/// A computer seat that plays `mark` on the given board.
pub trait Opponent {
    /// `None` when no move is left to make.
    fn choose_move(&self, board: &Board, mark: Cell, rng: &mut dyn RngCore) -> Option<(usize, usize)>;
}

/// Who sits in the seat opposite the human or the evaluated Learner.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentKind {
    #[default]
    Random,
    Minimax,
    /// A second person at the same console.
    Human,
}

/// Picks uniformly among the empty cells.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomOpponent;

/// Full-depth minimax; among equally good moves the lowest cell wins.
#[derive(Debug, Default)]
pub struct MinimaxOpponent {
    cache: RefCell<HashMap<(Board, Cell), Option<(usize, usize)>>>,
}

impl OpponentKind {
    /// The computer player for this kind, `None` for [`OpponentKind::Human`].
    pub fn build(self) -> Option<Box<dyn Opponent>> {
        match self {
            OpponentKind::Random => Some(Box::new(RandomOpponent)),
            OpponentKind::Minimax => Some(Box::new(MinimaxOpponent::default())),
            OpponentKind::Human => None,
        }
    }
}

impl FromStr for OpponentKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(OpponentKind::Random),
            "minimax" | "ai" => Ok(OpponentKind::Minimax),
            "human" | "two-player" => Ok(OpponentKind::Human),
            other => Err(InputError::UnknownOpponent(other.to_owned())),
        }
    }
}

impl fmt::Display for OpponentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            OpponentKind::Random => "random",
            OpponentKind::Minimax => "minimax",
            OpponentKind::Human => "human",
        };
        f.write_str(name)
    }
}

impl Opponent for RandomOpponent {
    fn choose_move(&self, board: &Board, _mark: Cell, rng: &mut dyn RngCore) -> Option<(usize, usize)> {
        board.legal_moves().choose(rng).map(|&index| to_row_col(index))
    }
}

/// Value of the position for `to_move`, who is about to play.
fn negamax(board: Board, to_move: Cell, depth: i32, mut alpha: i32, beta: i32) -> i32 {
    let mut best = -WIN_SCORE - 1;
    for index in board.legal_moves() {
        let score = move_score(board, index, to_move, depth, alpha, beta);
        best = best.max(score);
        alpha = alpha.max(score);
        if alpha >= beta {
            break;
        }
    }
    best
}

/// Value for `mark` of playing `index`; faster wins score higher.
fn move_score(board: Board, index: usize, mark: Cell, depth: i32, alpha: i32, beta: i32) -> i32 {
    let mut next = board;
    let (row, col) = to_row_col(index);
    next.apply_move(row, col, mark);
    if next.has_winner() {
        WIN_SCORE - depth
    } else if next.is_full() {
        0
    } else {
        -negamax(next, mark.other(), depth + 1, -beta, -alpha)
    }
}

impl MinimaxOpponent {
    fn best_move(board: &Board, mark: Cell) -> Option<(usize, usize)> {
        if board.has_winner() {
            return None;
        }
        let mut best: Option<(usize, i32)> = None;
        for index in board.legal_moves() {
            let score = move_score(*board, index, mark, 0, -WIN_SCORE - 1, WIN_SCORE + 1);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((index, score));
            }
        }
        best.map(|(index, _)| to_row_col(index))
    }
}

impl Opponent for MinimaxOpponent {
    fn choose_move(&self, board: &Board, mark: Cell, _rng: &mut dyn RngCore) -> Option<(usize, usize)> {
        *self
            .cache
            .borrow_mut()
            .entry((*board, mark))
            .or_insert_with(|| Self::best_move(board, mark))
    }
}
