use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use ttt_qlearn::config::TrainingConfig;
use ttt_qlearn::OpponentKind;

/// Tic-tac-toe Q-learning against a random opponent.
#[derive(Parser)]
#[command(name = "ttt", about = "Train a tic-tac-toe agent or play on the console")]
struct Cli {
    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train and export weights plus outcome history
    Train {
        /// Path to TOML configuration file
        #[arg(long, default_value = "train.toml")]
        config: PathBuf,

        /// Override number of training episodes
        #[arg(long)]
        episodes: Option<usize>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the output directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Play one game on the console
    Play {
        #[arg(long)]
        seed: Option<u64>,

        /// random, minimax, or human for two players
        #[arg(long, default_value = "random")]
        opponent: OpponentKind,
    },
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Train {
            config,
            episodes,
            seed,
            out,
        } => {
            let mut training = TrainingConfig::load_or_default(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            if let Some(episodes) = episodes {
                training.episodes = episodes;
            }
            if seed.is_some() {
                training.seed = seed;
            }
            if let Some(out) = out {
                training.output_dir = out;
            }
            let history = ttt_qlearn::train_agent(&training)?;
            info!(
                intervals = history.len(),
                output = %training.output_dir.display(),
                "done"
            );
        }
        Command::Play { seed, opponent } => {
            let outcome = ttt_qlearn::play_game_human_computer_player(seed, opponent)?;
            info!(%opponent, ?outcome, "game finished");
        }
    }
    Ok(())
}
