use itertools::Itertools;
use rand::Rng;
use std::fmt;

pub const SIZE: usize = 3;
pub const CELLS: usize = SIZE * SIZE;

/// Every winning line as row-major cell indices.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Cell {
    #[default]
    Empty,
    Cross,
    Nought,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    PlayerOne,
    Learner,
}

/// Which side has to act next, or whether the game is finished.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    LearnerTurn,
    OpponentTurn,
    Terminal(Outcome),
}

/// Result of a finished game, seen from the Learner's seat.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Board {
    cells: [[Cell; SIZE]; SIZE],
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameState {
    pub board: Board,
    pub starting_side: Side,
    pub current_turn: Side,
    pub winner: Option<Side>,
    pub is_draw: bool,
}

impl Cell {
    pub fn as_char(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Cross => 'X',
            Self::Nought => 'O',
        }
    }

    /// The opposing mark; `Empty` stays `Empty`.
    pub fn other(self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Cross => Self::Nought,
            Self::Nought => Self::Cross,
        }
    }
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::PlayerOne => Side::Learner,
            Self::Learner => Side::PlayerOne,
        }
    }
}

/// Splits a row-major action index into `(row, col)`.
pub fn to_row_col(action: usize) -> (usize, usize) {
    (action / SIZE, action % SIZE)
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Cell at a row-major index.
    pub fn at(&self, index: usize) -> Cell {
        let (row, col) = to_row_col(index);
        self.cells[row][col]
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().flatten().copied()
    }

    /// Marks the cell iff it is in range and currently empty.
    pub fn apply_move(&mut self, row: usize, col: usize, cell: Cell) -> bool {
        if row >= SIZE || col >= SIZE || cell == Cell::Empty {
            return false;
        }
        match self.cells[row][col] {
            Cell::Empty => {
                self.cells[row][col] = cell;
                true
            }
            _ => false,
        }
    }

    pub fn has_winner(&self) -> bool {
        LINES.iter().any(|line| {
            let first = self.at(line[0]);
            first != Cell::Empty && line.iter().all(|&i| self.at(i) == first)
        })
    }

    pub fn is_full(&self) -> bool {
        self.iter().all(|cell| cell != Cell::Empty)
    }

    pub fn legal_moves(&self) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, cell)| *cell == Cell::Empty)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn legal_mask(&self) -> [bool; CELLS] {
        let mut mask = [false; CELLS];
        for (slot, cell) in mask.iter_mut().zip(self.iter()) {
            *slot = cell == Cell::Empty;
        }
        mask
    }

    pub fn occupied_count(&self) -> usize {
        self.iter().filter(|cell| *cell != Cell::Empty).count()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "  1   2   3")?;
        let rows = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let label = (b'A' + i as u8) as char;
                let body = row.iter().map(|c| format!(" {} ", c.as_char())).join("|");
                format!("{label}{body}")
            })
            .join("\n---+---+---\n");
        writeln!(f, "{rows}")
    }
}

impl GameState {
    pub fn new(starting_side: Side) -> Self {
        GameState {
            board: Board::new(),
            starting_side,
            current_turn: starting_side,
            winner: None,
            is_draw: false,
        }
    }

    /// Fresh game with the starting side drawn from `rng`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let starting_side = if rng.gen_bool(0.5) {
            Side::PlayerOne
        } else {
            Side::Learner
        };
        Self::new(starting_side)
    }

    /// The starting side always plays Cross.
    pub fn mark_of(&self, side: Side) -> Cell {
        if side == self.starting_side {
            Cell::Cross
        } else {
            Cell::Nought
        }
    }

    pub fn learner_started_first(&self) -> bool {
        self.starting_side == Side::Learner
    }

    pub fn apply_move(&mut self, row: usize, col: usize, side: Side) -> bool {
        let mark = self.mark_of(side);
        self.board.apply_move(row, col, mark)
    }

    /// Settles winner or draw for the side that just moved, then hands the
    /// turn over. The turn flips even once the game is over.
    pub fn advance_turn(&mut self) {
        if self.board.has_winner() {
            self.winner = Some(self.current_turn);
        } else if self.board.is_full() {
            self.is_draw = true;
        }
        self.current_turn = self.current_turn.other();
    }

    pub fn phase(&self) -> Phase {
        match (self.outcome(), self.current_turn) {
            (Some(outcome), _) => Phase::Terminal(outcome),
            (None, Side::Learner) => Phase::LearnerTurn,
            (None, Side::PlayerOne) => Phase::OpponentTurn,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.winner {
            Some(Side::Learner) => Some(Outcome::Win),
            Some(Side::PlayerOne) => Some(Outcome::Loss),
            None if self.is_draw => Some(Outcome::Draw),
            None => None,
        }
    }
}
