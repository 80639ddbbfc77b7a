use crate::error::{Error, Result};
use std::path::Path;

/// Declarative board description, as stored in a world TOML file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoardDescription {
    pub title: String,

    /// `[width, height]`.
    pub size: [usize; 2],

    /// Default reward of every cell that is not overridden.
    pub reward: f64,

    pub gamma: f64,

    pub epsilon: f64,

    /// Outcome likelihoods ordered `[front, left, right, back]`.
    pub probability: [f64; 4],

    #[serde(default)]
    pub state: Vec<StateOverride>,
}

/// One `[[state]]` entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateOverride {
    pub s_type: String,

    /// `[x, y]`.
    pub position: [usize; 2],

    #[serde(default)]
    pub value: Option<f64>,
}

const PROBABILITY_TOLERANCE: f64 = 1e-9;

impl BoardDescription {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let desc: BoardDescription = toml::from_str(content)?;
        desc.validate()?;
        Ok(desc)
    }

    /// Load and validate a board description from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "loaded board description");
        Self::from_toml_str(&content)
    }

    pub fn width(&self) -> usize {
        self.size[0]
    }

    pub fn height(&self) -> usize {
        self.size[1]
    }

    /// Scalar checks only. Cell kind codes are checked by the board builder.
    pub fn validate(&self) -> Result<()> {
        if self.width() == 0 || self.height() == 0 {
            return Err(Error::EmptyBoard {
                width: self.width(),
                height: self.height(),
            });
        }
        validate_unit_interval("gamma", self.gamma)?;
        validate_unit_interval("epsilon", self.epsilon)?;
        validate_probabilities(&self.probability)
    }
}

pub fn validate_unit_interval(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}

pub fn validate_probabilities(probabilities: &[f64; 4]) -> Result<()> {
    let in_range = probabilities.iter().all(|p| (0.0..=1.0).contains(p));
    let sum: f64 = probabilities.iter().sum();
    if in_range && (sum - 1.0).abs() < PROBABILITY_TOLERANCE {
        Ok(())
    } else {
        Err(Error::InvalidProbabilities {
            probabilities: *probabilities,
        })
    }
}
