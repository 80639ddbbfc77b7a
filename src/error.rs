use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading a board or running a solver on it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown cell kind '{code}' (expected one of N, S, T, F, B)")]
    UnknownCellKind { code: String },

    #[error("cell kind {kind} at ({x}, {y}) requires a reward value")]
    MissingRewardValue { kind: String, x: usize, y: usize },

    #[error("position ({x}, {y}) is outside the {width}x{height} board")]
    PositionOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("board of size {width}x{height} has no cells")]
    EmptyBoard { width: usize, height: usize },

    #[error("outcome probabilities {probabilities:?} must lie in [0, 1] and sum to 1")]
    InvalidProbabilities { probabilities: [f64; 4] },

    #[error("{name} = {value} must be in [0, 1]")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("convergence threshold {value} must be a positive finite number")]
    InvalidThreshold { value: f64 },

    #[error("cell at index ({x}, {y}) records position ({cell_x}, {cell_y})")]
    MisplacedCell {
        x: usize,
        y: usize,
        cell_x: usize,
        cell_y: usize,
    },

    #[error("neither an iteration count nor a convergence threshold was given")]
    NoTerminationCriterion,

    #[error("board has no start cell")]
    MissingStartCell,

    #[error("board has no terminal cell, episodes would never end")]
    MissingTerminalCell,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot sample an outcome: {0}")]
    Sampling(#[from] rand::distributions::WeightedError),
}
