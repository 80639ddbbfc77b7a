use super::board::BoardBuilder;
use super::cell::{Action, Cell, CellKind};
use crate::algos::model_based::{Mdp, Transition};
use crate::config::{validate_probabilities, validate_unit_interval, BoardDescription};
use crate::error::{Error, Result};
use crate::mdps::mdp_simulator::pick_next;
use ndarray::Array2;
use rand::Rng;
use std::ops::{Index, IndexMut};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Outcome slots of a commanded action, indexing `outcome_probabilities`.
pub const FRONT: usize = 0;
pub const LEFT: usize = 1;
pub const RIGHT: usize = 2;
pub const BACK: usize = 3;

/// `(dx, dy)` per `[action][outcome slot]`. `y` grows upwards, "left" is a
/// quarter turn counter-clockwise from the commanded direction.
const OUTCOME_DELTAS: [[(i64, i64); 4]; 4] = [
    // Up
    [(0, 1), (-1, 0), (1, 0), (0, -1)],
    // Left
    [(-1, 0), (0, -1), (0, 1), (1, 0)],
    // Right
    [(1, 0), (0, 1), (0, -1), (-1, 0)],
    // Down
    [(0, -1), (1, 0), (-1, 0), (0, 1)],
];

/// Why a movement left the agent where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blocked {
    OutOfBounds,
    Forbidden,
}

/// Grid-world MDP: the board plus its stochastic motion model.
#[derive(Debug, Clone)]
pub struct GridWorld {
    title: String,
    cells: Array2<Cell>,
    gamma: f64,
    epsilon: f64,
    probabilities: [f64; 4],
}

impl GridWorld {
    pub fn new(
        title: &str,
        cells: Array2<Cell>,
        gamma: f64,
        epsilon: f64,
        probabilities: [f64; 4],
    ) -> Result<Self> {
        if cells.is_empty() {
            return Err(Error::EmptyBoard {
                width: cells.ncols(),
                height: cells.nrows(),
            });
        }
        if let Some(((y, x), c)) = cells
            .indexed_iter()
            .find(|((y, x), c)| (c.x(), c.y()) != (*x, *y))
        {
            return Err(Error::MisplacedCell {
                x,
                y,
                cell_x: c.x(),
                cell_y: c.y(),
            });
        }
        validate_unit_interval("gamma", gamma)?;
        validate_unit_interval("epsilon", epsilon)?;
        validate_probabilities(&probabilities)?;

        Ok(Self {
            title: title.to_string(),
            cells,
            gamma,
            epsilon,
            probabilities,
        })
    }

    pub fn from_description(desc: &BoardDescription) -> Result<Self> {
        desc.validate()?;
        let cells = BoardBuilder::from_description(desc).build()?;
        Self::new(
            &desc.title,
            cells,
            desc.gamma,
            desc.epsilon,
            desc.probability,
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_description(&BoardDescription::load(path)?)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    pub fn max_x(&self) -> usize {
        self.width() - 1
    }

    pub fn max_y(&self) -> usize {
        self.height() - 1
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn probabilities(&self) -> &[f64; 4] {
        &self.probabilities
    }

    pub fn field(&self, pos: Position) -> Option<&Cell> {
        self.cells.get([pos.y, pos.x])
    }

    pub fn field_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.cells.get_mut([pos.y, pos.x])
    }

    /// Every cell, `y` ascending then `x` ascending.
    pub fn all_fields(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn all_fields_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    /// Positions of non-terminal, non-forbidden cells in board-scan order.
    pub fn decision_positions(&self) -> Vec<Position> {
        self.all_fields()
            .filter(|c| c.is_decision_cell())
            .map(|c| Position::new(c.x(), c.y()))
            .collect()
    }

    pub fn start_field(&self) -> Option<Position> {
        self.all_fields()
            .find(|c| c.kind() == CellKind::Start)
            .map(|c| Position::new(c.x(), c.y()))
    }

    fn is_terminal(&self, pos: Position) -> bool {
        self.field(pos).map_or(false, Cell::is_terminal)
    }

    fn step_target(
        &self,
        pos: Position,
        (dx, dy): (i64, i64),
    ) -> std::result::Result<Position, Blocked> {
        let x = pos.x as i64 + dx;
        let y = pos.y as i64 + dy;
        if x < 0 || y < 0 {
            return Err(Blocked::OutOfBounds);
        }

        let target = Position::new(x as usize, y as usize);
        match self.field(target) {
            None => Err(Blocked::OutOfBounds),
            Some(c) if c.is_forbidden() => Err(Blocked::Forbidden),
            Some(_) => Ok(target),
        }
    }

    fn move_by(&self, pos: Position, delta: (i64, i64)) -> Position {
        if self.is_terminal(pos) {
            return pos;
        }

        self.step_target(pos, delta).unwrap_or(pos)
    }

    /// Candidate cells for the `[front, left, right, back]` outcomes of
    /// commanding `action` in `pos`.
    pub fn outcomes(&self, pos: Position, action: Action) -> [Position; 4] {
        OUTCOME_DELTAS[action.index()].map(|delta| self.move_by(pos, delta))
    }

    /// Realises one commanded action by drawing an outcome slot.
    pub fn agent_move<R: Rng>(
        &self,
        rng: &mut R,
        pos: Position,
        action: Action,
    ) -> Result<Position> {
        let ts = self.transitions(pos, action);
        pick_next(rng, &ts[..])
    }

    /// Clears value histories and policies.
    pub fn clean_values(&mut self) {
        self.cells.iter_mut().for_each(Cell::clean_values);
    }

    /// Resets every action value and visit counter.
    pub fn clean_q(&mut self) {
        self.cells.iter_mut().for_each(Cell::clean_q);
    }
}

impl Index<Position> for GridWorld {
    type Output = Cell;

    fn index(&self, pos: Position) -> &Cell {
        &self.cells[[pos.y, pos.x]]
    }
}

impl IndexMut<Position> for GridWorld {
    fn index_mut(&mut self, pos: Position) -> &mut Cell {
        &mut self.cells[[pos.y, pos.x]]
    }
}

impl Mdp for GridWorld {
    fn n_s(&self) -> usize {
        self.cells.len()
    }

    fn n_a(&self) -> usize {
        Action::ALL.len()
    }

    fn transitions(&self, pos: Position, action: Action) -> [Transition; 4] {
        let outcomes = self.outcomes(pos, action);
        [FRONT, LEFT, RIGHT, BACK].map(|slot| Transition {
            next: outcomes[slot],
            probability: self.probabilities[slot],
        })
    }

    fn gamma(&self) -> f64 {
        self.gamma
    }
}
