use super::cell::{Cell, CellKind};
use crate::config::BoardDescription;
use crate::error::{Error, Result};
use ndarray::Array2;

/// A single explicit cell in a board description, kind still as its code.
#[derive(Debug, Clone, PartialEq)]
pub struct CellOverride {
    pub code: String,
    pub x: usize,
    pub y: usize,
    pub value: Option<f64>,
}

impl CellOverride {
    pub fn new(code: &str, x: usize, y: usize, value: Option<f64>) -> Self {
        Self {
            code: code.to_string(),
            x,
            y,
            value,
        }
    }
}

/// Turns a size, a default reward and a list of overrides into a fully
/// populated board indexed `[[y, x]]`.
#[derive(Debug, Clone)]
pub struct BoardBuilder {
    width: usize,
    height: usize,
    default_reward: f64,
    overrides: Vec<CellOverride>,
}

impl BoardBuilder {
    pub fn new(width: usize, height: usize, default_reward: f64) -> Self {
        Self {
            width,
            height,
            default_reward,
            overrides: vec![],
        }
    }

    pub fn from_description(desc: &BoardDescription) -> Self {
        desc.state.iter().fold(
            Self::new(desc.width(), desc.height(), desc.reward),
            |builder, s| {
                builder.with_override(CellOverride::new(
                    &s.s_type,
                    s.position[0],
                    s.position[1],
                    s.value,
                ))
            },
        )
    }

    pub fn with_override(mut self, cell: CellOverride) -> Self {
        self.overrides.push(cell);
        self
    }

    pub fn build(&self) -> Result<Array2<Cell>> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::EmptyBoard {
                width: self.width,
                height: self.height,
            });
        }

        let mut board = Array2::from_shape_fn((self.height, self.width), |(y, x)| {
            Cell::new(CellKind::Normal, x, y, Some(self.default_reward))
        });

        for o in &self.overrides {
            let cell = self.override_cell(o)?;
            board[[o.y, o.x]] = cell;
        }

        Ok(board)
    }

    fn override_cell(&self, o: &CellOverride) -> Result<Cell> {
        let kind = o.code.parse::<CellKind>()?;
        if o.x >= self.width || o.y >= self.height {
            return Err(Error::PositionOutOfBounds {
                x: o.x,
                y: o.y,
                width: self.width,
                height: self.height,
            });
        }

        let reward = match kind {
            CellKind::Terminal | CellKind::Special => {
                Some(o.value.ok_or_else(|| Error::MissingRewardValue {
                    kind: kind.to_string(),
                    x: o.x,
                    y: o.y,
                })?)
            }
            CellKind::Forbidden => None,
            CellKind::Start => Some(self.default_reward),
            CellKind::Normal => Some(o.value.unwrap_or(self.default_reward)),
        };

        Ok(Cell::new(kind, o.x, o.y, reward))
    }
}
