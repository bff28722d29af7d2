use crate::approximator::{format_values, td_target, ActionValueApproximator};
use crate::board::{to_row_col, GameState, Outcome, Phase, Side, CELLS};
use crate::config::{ApproximatorConfig, TrainingConfig};
use crate::encoding::{encode, EncodedState};
use crate::error::{ConfigError, ExportError};
use crate::export::{HistorySink, WeightSink, WEIGHTS_NAME};
use crate::network::NetworkApproximator;
use crate::opponent::{Opponent, RandomOpponent};
use crate::policy::EpsilonGreedy;
use crate::q_table::QTable;
use crate::rewards::RewardShaper;
use crate::stats::{TrainingHistory, TrainingStatistics};
use rand::Rng;
use tracing::{debug, info};

/// What the Learner did on one of its turns.
#[derive(Clone, Debug)]
pub struct LearnerMove {
    pub state: EncodedState,
    pub action: usize,
    pub reward: f32,
    pub invalid_attempts: usize,
}

/// Q-learning against a [`RandomOpponent`], one online update per Learner move.
pub struct Trainer<A, R> {
    approximator: A,
    policy: EpsilonGreedy,
    shaper: RewardShaper,
    opponent: RandomOpponent,
    rng: R,
    gamma: f32,
    stats: TrainingStatistics,
    history: TrainingHistory,
    episode: usize,
    log_interval: usize,
}

pub fn build_approximator<R: Rng + ?Sized>(
    config: &ApproximatorConfig,
    rng: &mut R,
) -> Box<dyn ActionValueApproximator> {
    match config {
        ApproximatorConfig::Table {
            learning_rate,
            initial_value,
        } => Box::new(QTable::new(*learning_rate, *initial_value)),
        ApproximatorConfig::Network {
            hidden_layers,
            learning_rate,
        } => Box::new(NetworkApproximator::new(hidden_layers, *learning_rate, rng)),
    }
}

impl<A, R> Trainer<A, R>
where
    A: ActionValueApproximator,
    R: Rng,
{
    pub fn new(approximator: A, rng: R, config: &TrainingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Trainer {
            approximator,
            policy: EpsilonGreedy::from_config(&config.exploration),
            shaper: RewardShaper::new(config.rewards.clone()),
            opponent: RandomOpponent,
            rng,
            gamma: config.gamma,
            stats: TrainingStatistics::default(),
            history: TrainingHistory::new(config.stats_interval),
            episode: 0,
            log_interval: config.log_interval,
        })
    }

    pub fn approximator(&self) -> &A {
        &self.approximator
    }

    pub fn policy(&self) -> &EpsilonGreedy {
        &self.policy
    }

    pub fn stats(&self) -> &TrainingStatistics {
        &self.stats
    }

    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Runs `episodes` episodes, then exports the weights and, when given,
    /// the outcome history.
    pub fn train(
        &mut self,
        episodes: usize,
        weights: &mut dyn WeightSink,
        history: Option<&mut dyn HistorySink>,
    ) -> Result<TrainingHistory, ExportError> {
        info!(episodes, gamma = self.gamma, epsilon = self.policy.epsilon(), "training started");
        for _ in 0..episodes {
            self.run_episode();
        }
        weights.export_weights(WEIGHTS_NAME, &self.approximator.weights())?;
        if let Some(sink) = history {
            sink.export_history(&self.history)?;
        }
        info!(episodes = self.episode, intervals = self.history.len(), "training finished");
        Ok(self.history.clone())
    }

    /// One game from an empty board with a random starting side.
    pub fn run_episode(&mut self) -> Outcome {
        let game = GameState::random(&mut self.rng);
        self.play_from(game)
    }

    /// Plays `game` to the end as a training episode and books the result.
    pub fn play_from(&mut self, mut game: GameState) -> Outcome {
        let mut last: Option<LearnerMove> = None;
        let outcome = loop {
            match game.phase() {
                Phase::LearnerTurn => last = Some(self.learner_turn(&mut game)),
                Phase::OpponentTurn => self.opponent_turn(&mut game, last.as_ref()),
                Phase::Terminal(outcome) => break outcome,
            }
        };
        self.finish_episode(outcome);
        outcome
    }

    fn finish_episode(&mut self, outcome: Outcome) {
        self.stats.record(outcome);
        self.policy.decay();
        self.episode += 1;
        if self.episode % self.history.interval == 0 {
            self.history.snapshot(&mut self.stats);
        }
        if self.episode % self.log_interval == 0 {
            let last = |v: &Vec<u32>| v.last().copied().unwrap_or_default();
            info!(
                episode = self.episode,
                epsilon = self.policy.epsilon(),
                wins = last(&self.history.wins),
                losses = last(&self.history.losses),
                draws = last(&self.history.draws),
                "progress"
            );
        }
    }

    /// Lets the Learner move, retrying on the unchanged position until a
    /// legal cell is picked. Every attempt is followed by one update.
    pub fn learner_turn(&mut self, game: &mut GameState) -> LearnerMove {
        let state = encode(&game.board, game.learner_started_first());
        let legal = game.board.legal_mask();
        let mark = game.mark_of(Side::Learner);
        let mut rejected = [false; CELLS];
        let mut invalid_attempts = 0;
        loop {
            let action = self.policy.select_action(
                &self.approximator,
                &state,
                &legal,
                &rejected,
                &mut self.rng,
            );
            let (row, col) = to_row_col(action);
            if !game.apply_move(row, col, Side::Learner) {
                rejected[action] = true;
                invalid_attempts += 1;
                let reward = self.shaper.score_invalid();
                let target = self.approximator.predict(&state).with_target(action, reward);
                self.approximator.update(&state, &target);
                debug!(action, invalid_attempts, "learner picked an occupied cell");
                continue;
            }

            let outcome = if game.board.has_winner() {
                Some(Outcome::Win)
            } else if game.board.is_full() {
                Some(Outcome::Draw)
            } else {
                None
            };
            let reward = self.shaper.score(true, outcome, &game.board, mark);
            let next_state = encode(&game.board, game.learner_started_first());
            let next_values = match outcome {
                Some(_) => None,
                None => Some(self.approximator.predict(&next_state)),
            };
            let target_value = td_target(reward, self.gamma, next_values.as_ref());
            let target = self.approximator.predict(&state).with_target(action, target_value);
            self.approximator.update(&state, &target);
            game.advance_turn();

            return LearnerMove {
                state,
                action,
                reward,
                invalid_attempts,
            };
        }
    }

    /// Random reply. When it ends the game, the Learner's last move is
    /// updated once more toward the terminal reward.
    fn opponent_turn(&mut self, game: &mut GameState, last: Option<&LearnerMove>) {
        let mark = game.mark_of(Side::PlayerOne);
        if let Some((row, col)) = self.opponent.choose_move(&game.board, mark, &mut self.rng) {
            game.apply_move(row, col, Side::PlayerOne);
        }
        game.advance_turn();

        if let (Some(outcome), Some(last)) = (game.outcome(), last) {
            let reward = last.reward + self.shaper.score_opponent_finish(outcome);
            let target = self
                .approximator
                .predict(&last.state)
                .with_target(last.action, reward);
            self.approximator.update(&last.state, &target);
        }
    }

    /// Greedy games over legal cells against `opponent`. Nothing is learned
    /// and the training counters are left alone.
    pub fn evaluate(&mut self, opponent: &dyn Opponent, games: usize) -> TrainingStatistics {
        let mut results = TrainingStatistics::default();
        for _ in 0..games {
            let mut game = GameState::random(&mut self.rng);
            let outcome = loop {
                match game.phase() {
                    Phase::LearnerTurn => {
                        let state = encode(&game.board, game.learner_started_first());
                        let legal = game.board.legal_mask();
                        if let Some(action) =
                            EpsilonGreedy::greedy_legal(&self.approximator, &state, &legal)
                        {
                            let (row, col) = to_row_col(action);
                            game.apply_move(row, col, Side::Learner);
                        }
                        game.advance_turn();
                    }
                    Phase::OpponentTurn => {
                        let mark = game.mark_of(Side::PlayerOne);
                        if let Some((row, col)) = opponent.choose_move(&game.board, mark, &mut self.rng) {
                            game.apply_move(row, col, Side::PlayerOne);
                        }
                        game.advance_turn();
                    }
                    Phase::Terminal(outcome) => break outcome,
                }
            };
            results.record(outcome);
        }
        let opening = encode(&GameState::new(Side::Learner).board, true);
        debug!(values = %format_values(&self.approximator.predict(&opening)), "opening values");
        results
    }
}
