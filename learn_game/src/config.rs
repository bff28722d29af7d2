use crate::error::ConfigError;
use crate::opponent::OpponentKind;
use crate::rewards::RewardConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const NUM_EPISODES: usize = 5_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    pub initial_epsilon: f64,
    pub decay: f64,
    pub min_epsilon: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        ExplorationConfig {
            initial_epsilon: 1.0,
            decay: 0.999,
            min_epsilon: 0.0,
        }
    }
}

/// Which action-value approximator to train.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApproximatorConfig {
    /// The table is only written at the positions the Learner decides in.
    /// When the Learner moved first, the position after its move has one
    /// more Learner mark than any stored key, so the bootstrap reads
    /// `initial_value` and `gamma` only scales that constant. When it moved
    /// second, the post-move position can match a stored first-mover key.
    Table {
        learning_rate: f32,
        #[serde(default)]
        initial_value: f32,
    },
    Network {
        hidden_layers: Vec<usize>,
        learning_rate: f32,
    },
}

impl Default for ApproximatorConfig {
    fn default() -> Self {
        ApproximatorConfig::Network {
            hidden_layers: vec![128, 64],
            learning_rate: 0.001,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    pub gamma: f32,
    /// Episodes per history snapshot.
    pub stats_interval: usize,
    pub log_interval: usize,
    /// Greedy games after training; 0 skips it.
    pub evaluation_games: usize,
    /// Computer player faced in those games.
    pub evaluation_opponent: OpponentKind,
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    pub exploration: ExplorationConfig,
    pub rewards: RewardConfig,
    pub approximator: ApproximatorConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: NUM_EPISODES,
            gamma: 0.5,
            stats_interval: 100,
            log_interval: 1_000,
            evaluation_games: 0,
            evaluation_opponent: OpponentKind::Random,
            seed: None,
            output_dir: PathBuf::from("weights_archive"),
            exploration: ExplorationConfig::default(),
            rewards: RewardConfig::default(),
            approximator: ApproximatorConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: TrainingConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`TrainingConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.episodes == 0 {
            return Err(ConfigError::Validation("episodes must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::Validation("gamma must be in [0, 1]".into()));
        }
        if self.stats_interval == 0 {
            return Err(ConfigError::Validation("stats_interval must be > 0".into()));
        }
        if self.log_interval == 0 {
            return Err(ConfigError::Validation("log_interval must be > 0".into()));
        }
        if self.evaluation_opponent == OpponentKind::Human {
            return Err(ConfigError::Validation(
                "evaluation_opponent must be a computer player".into(),
            ));
        }
        let exploration = &self.exploration;
        if !(0.0..=1.0).contains(&exploration.initial_epsilon) {
            return Err(ConfigError::Validation(
                "exploration.initial_epsilon must be in [0, 1]".into(),
            ));
        }
        if !(exploration.decay > 0.0 && exploration.decay <= 1.0) {
            return Err(ConfigError::Validation(
                "exploration.decay must be in (0, 1]".into(),
            ));
        }
        if exploration.min_epsilon < 0.0 || exploration.min_epsilon > exploration.initial_epsilon {
            return Err(ConfigError::Validation(
                "exploration.min_epsilon must be in [0, initial_epsilon]".into(),
            ));
        }
        match &self.approximator {
            ApproximatorConfig::Table { learning_rate, .. } => {
                if !(*learning_rate > 0.0 && *learning_rate <= 1.0) {
                    return Err(ConfigError::Validation(
                        "approximator.learning_rate must be in (0, 1] for a table".into(),
                    ));
                }
            }
            ApproximatorConfig::Network {
                hidden_layers,
                learning_rate,
            } => {
                if *learning_rate <= 0.0 {
                    return Err(ConfigError::Validation(
                        "approximator.learning_rate must be > 0".into(),
                    ));
                }
                if hidden_layers.iter().any(|&n| n == 0) {
                    return Err(ConfigError::Validation(
                        "approximator.hidden_layers must not contain 0".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TrainingConfig::default();
        config.validate().unwrap();
        assert_eq!(config.gamma, 0.5);
        assert_eq!(config.exploration.decay, 0.999);
        assert_eq!(config.rewards.invalid_move, -20.0);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let text = r#"
            episodes = 200
            seed = 7

            [exploration]
            decay = 0.99

            [approximator]
            kind = "table"
            learning_rate = 0.2
        "#;
        let config: TrainingConfig = toml::from_str(text).unwrap();
        assert_eq!(config.episodes, 200);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.exploration.decay, 0.99);
        assert_eq!(config.exploration.initial_epsilon, 1.0);
        assert_eq!(
            config.approximator,
            ApproximatorConfig::Table {
                learning_rate: 0.2,
                initial_value: 0.0
            }
        );
        assert_eq!(config.rewards, RewardConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = TrainingConfig::default();
        config.gamma = 1.5;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.exploration.decay = 0.0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.approximator = ApproximatorConfig::Network {
            hidden_layers: vec![64, 0],
            learning_rate: 0.001,
        };
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.evaluation_opponent = OpponentKind::Human;
        assert!(config.validate().is_err());
    }

    #[test]
    fn evaluation_opponent_reads_from_toml() {
        let config: TrainingConfig =
            toml::from_str("evaluation_games = 50\nevaluation_opponent = \"minimax\"\n").unwrap();
        assert_eq!(config.evaluation_opponent, OpponentKind::Minimax);
        config.validate().unwrap();
        assert_eq!(TrainingConfig::default().evaluation_opponent, OpponentKind::Random);
    }

    #[test]
    fn load_reads_file_and_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.toml");
        std::fs::write(&path, "episodes = 10\ngamma = 0.9\n").unwrap();
        let config = TrainingConfig::load(&path).unwrap();
        assert_eq!(config.episodes, 10);
        assert_eq!(config.gamma, 0.9);

        let missing = dir.path().join("missing.toml");
        assert_eq!(TrainingConfig::load_or_default(&missing).unwrap(), TrainingConfig::default());
        assert!(matches!(
            TrainingConfig::load(&missing),
            Err(ConfigError::FileRead { .. })
        ));
    }
}
