use crate::config::TrainingConfig;
use crate::export::{CsvHistorySink, FileWeightSink};
use crate::session::InteractiveSession;
use crate::stats::TrainingHistory;
use crate::trainer::{build_approximator, Trainer};
use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use tracing::info;

pub mod approximator;
pub mod board;
pub mod config;
pub mod encoding;
pub mod error;
pub mod export;
pub mod network;
pub mod opponent;
pub mod policy;
pub mod q_table;
pub mod rewards;
pub mod session;
pub mod stats;
pub mod trainer;

pub use crate::approximator::{ActionValueApproximator, ActionValues, Weights};
pub use crate::board::{Board, Cell, GameState, Outcome, Phase, Side};
pub use crate::encoding::{encode, EncodedState};
pub use crate::opponent::{MinimaxOpponent, Opponent, OpponentKind, RandomOpponent};

/// History file written next to the exported weights.
pub const HISTORY_FILE: &str = "history.csv";

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Trains the configured approximator against the random opponent and writes
/// weights plus history into `config.output_dir`.
pub fn train_agent(config: &TrainingConfig) -> anyhow::Result<TrainingHistory> {
    config.validate().context("invalid training configuration")?;
    let mut rng = seeded_rng(config.seed);
    let approximator = build_approximator(&config.approximator, &mut rng);
    let mut trainer =
        Trainer::new(approximator, rng, config).context("invalid training configuration")?;

    let mut weights = FileWeightSink::new(&config.output_dir);
    let mut history = CsvHistorySink::new(config.output_dir.join(HISTORY_FILE));
    let result = trainer
        .train(config.episodes, &mut weights, Some(&mut history))
        .with_context(|| format!("exporting into {}", config.output_dir.display()))?;

    let opponent = config.evaluation_opponent.build();
    if let (Some(opponent), true) = (opponent, config.evaluation_games > 0) {
        let stats = trainer.evaluate(opponent.as_ref(), config.evaluation_games);
        info!(
            opponent = %config.evaluation_opponent,
            games = stats.total(),
            wins = stats.wins,
            losses = stats.losses,
            draws = stats.draws,
            "greedy evaluation"
        );
    }
    Ok(result)
}

/// One console game against `opponent`, or between two people for
/// [`OpponentKind::Human`].
pub fn play_game_human_computer_player(seed: Option<u64>, opponent: OpponentKind) -> anyhow::Result<Outcome> {
    let stdin = io::stdin();
    let mut session = InteractiveSession::new(stdin.lock(), io::stdout(), seeded_rng(seed), opponent);
    session.play().context("interactive game aborted")
}
