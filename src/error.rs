//! Error types for the maze learner

use std::path::PathBuf;

use thiserror::Error;

/// Invalid learning parameters. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a finite value in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },

    #[error("max_steps must be positive")]
    NonPositiveStepLimit,

    #[error("episodes must be positive")]
    NonPositiveEpisodes,

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures while turning a maze source into a `Grid`.
#[derive(Error, Debug)]
pub enum MazeLoadError {
    #[error("failed to read maze file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("maze is empty")]
    Empty,

    #[error("ragged maze: line {line} has {found} cells, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid cell '{character}' at line {line}, column {column} (expected a digit 0-7)")]
    InvalidCell {
        line: usize,
        column: usize,
        character: char,
    },

    #[error("cell at line {line}, column {column} is not a maze cell")]
    InvalidCellType { line: usize, column: usize },

    #[error("maze has no start cell")]
    MissingStart,

    #[error("maze has no goal cell")]
    MissingGoal,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    MazeLoad(#[from] MazeLoadError),

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
