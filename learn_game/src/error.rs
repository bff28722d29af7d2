use std::path::PathBuf;

/// Errors raised while loading or validating a training configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors raised while persisting weights or history.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pickle error: {0}")]
    Pickle(#[from] serde_pickle::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Rejected move text in the interactive session.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("expected a row letter and a column digit, e.g. A1")]
    Malformed,

    #[error("row '{0}' is not one of A, B, C")]
    BadRow(char),

    #[error("column '{0}' is not one of 1, 2, 3")]
    BadColumn(char),

    #[error("cell {0} is already taken")]
    Occupied(String),

    #[error("unknown opponent '{0}', expected random, minimax or human")]
    UnknownOpponent(String),
}
