//! Console games: a human against a computer seat, or two humans.
//!
//! The computer seat plays random or minimax moves; the trained approximator
//! is not consulted here.

use crate::board::{GameState, Outcome, Phase, Side, SIZE};
use crate::error::InputError;
use crate::opponent::{Opponent, OpponentKind};
use rand::Rng;
use std::io::{self, BufRead, Write};

/// Parses `A1`..`C3` (row letter, column digit) into `(row, col)`.
pub fn parse_move(input: &str) -> Result<(usize, usize), InputError> {
    let mut chars = input.trim().chars();
    let (Some(r), Some(c), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(InputError::Malformed);
    };
    let row = match r.to_ascii_uppercase() {
        'A' => 0,
        'B' => 1,
        'C' => 2,
        other => return Err(InputError::BadRow(other)),
    };
    let col = match c.to_digit(10) {
        Some(d @ 1..=3) => d as usize - 1,
        _ => return Err(InputError::BadColumn(c)),
    };
    debug_assert!(row < SIZE && col < SIZE);
    Ok((row, col))
}

fn cell_name(row: usize, col: usize) -> String {
    format!("{}{}", (b'A' + row as u8) as char, col + 1)
}

pub struct InteractiveSession<I, O, R> {
    input: I,
    output: O,
    rng: R,
    /// Plays the second seat; `None` hands it to a second person.
    computer: Option<Box<dyn Opponent>>,
}

impl<I, O, R> InteractiveSession<I, O, R>
where
    I: BufRead,
    O: Write,
    R: Rng,
{
    pub fn new(input: I, output: O, rng: R, opponent: OpponentKind) -> Self {
        InteractiveSession {
            input,
            output,
            rng,
            computer: opponent.build(),
        }
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Plays one game. The outcome is from the second seat, so
    /// [`Outcome::Loss`] means the first human won.
    pub fn play(&mut self) -> io::Result<Outcome> {
        let mut game = GameState::random(&mut self.rng);
        let second = if self.computer.is_some() { "Computer" } else { "Player 2" };
        let starter = match (game.starting_side, self.computer.is_some()) {
            (Side::PlayerOne, true) => "You start",
            (Side::PlayerOne, false) => "Player 1 starts",
            (Side::Learner, true) => "Computer starts",
            (Side::Learner, false) => "Player 2 starts",
        };
        writeln!(self.output, "{starter} first, first player is always X (Cross)")?;

        let outcome = loop {
            match game.phase() {
                Phase::OpponentTurn => {
                    write!(self.output, "{}", game.board)?;
                    if self.computer.is_none() {
                        writeln!(self.output, "Player 1 ({}) to move", game.mark_of(Side::PlayerOne).as_char())?;
                    }
                    let (row, col) = self.read_move(&game)?;
                    game.apply_move(row, col, Side::PlayerOne);
                    game.advance_turn();
                }
                Phase::LearnerTurn => {
                    let mark = game.mark_of(Side::Learner);
                    let picked = match &self.computer {
                        Some(computer) => {
                            writeln!(self.output, "Computer is making a move...")?;
                            computer.choose_move(&game.board, mark, &mut self.rng)
                        }
                        None => {
                            write!(self.output, "{}", game.board)?;
                            writeln!(self.output, "Player 2 ({}) to move", mark.as_char())?;
                            Some(self.read_move(&game)?)
                        }
                    };
                    if let Some((row, col)) = picked {
                        game.apply_move(row, col, Side::Learner);
                    }
                    game.advance_turn();
                }
                Phase::Terminal(outcome) => break outcome,
            }
        };

        write!(self.output, "{}", game.board)?;
        match outcome {
            Outcome::Draw => writeln!(self.output, "Game over! Draw!")?,
            Outcome::Loss if self.computer.is_some() => writeln!(self.output, "Game over! You win!")?,
            Outcome::Loss => writeln!(self.output, "Game over! Player 1 wins!")?,
            Outcome::Win => writeln!(self.output, "Game over! {second} wins!")?,
        }
        self.output.flush()?;
        Ok(outcome)
    }

    /// Prompts until a legal move is entered. End of input is an error.
    fn read_move(&mut self, game: &GameState) -> io::Result<(usize, usize)> {
        loop {
            write!(self.output, "Enter your move (e.g., A1): ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
            }
            let checked = parse_move(&line).and_then(|(row, col)| {
                if game.board.legal_mask()[row * SIZE + col] {
                    Ok((row, col))
                } else {
                    Err(InputError::Occupied(cell_name(row, col)))
                }
            });
            match checked {
                Ok(mv) => return Ok(mv),
                Err(e) => writeln!(self.output, "Invalid move ({e}). Try again.")?,
            }
        }
    }
}
