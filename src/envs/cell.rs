use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Compass actions in canonical order. Ties are always broken towards the
/// earlier variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Action {
    Up,
    Left,
    Right,
    Down,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Up, Action::Left, Action::Right, Action::Down];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn symbol(self) -> char {
        match self {
            Action::Up => '^',
            Action::Left => '<',
            Action::Right => '>',
            Action::Down => 'v',
        }
    }
}

/// Index of the first maximum, so the canonical order decides ties.
pub fn argmax(values: &[f64; 4]) -> Action {
    let best = (1..values.len()).fold(0, |best, i| if values[i] > values[best] { i } else { best });
    Action::ALL[best]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CellKind {
    Normal,
    Start,
    Terminal,
    Forbidden,
    Special,
}

impl CellKind {
    pub fn code(self) -> &'static str {
        match self {
            CellKind::Normal => "N",
            CellKind::Start => "S",
            CellKind::Terminal => "T",
            CellKind::Forbidden => "F",
            CellKind::Special => "B",
        }
    }

    pub fn requires_value(self) -> bool {
        matches!(self, CellKind::Terminal | CellKind::Special)
    }
}

impl FromStr for CellKind {
    type Err = Error;

    fn from_str(code: &str) -> Result<Self> {
        match code {
            "N" => Ok(CellKind::Normal),
            "S" => Ok(CellKind::Start),
            "T" => Ok(CellKind::Terminal),
            "F" => Ok(CellKind::Forbidden),
            "B" => Ok(CellKind::Special),
            c => Err(Error::UnknownCellKind { code: c.to_string() }),
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One board position.
///
/// `value_history` is an append-only log of value-iteration estimates. The
/// learning agent only touches `action_values` and `action_visits`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    x: usize,
    y: usize,
    kind: CellKind,
    reward: Option<f64>,
    value_history: Vec<f64>,
    policy: Option<Action>,
    action_values: [f64; 4],
    action_visits: [u64; 4],
}

impl Cell {
    pub(crate) fn new(kind: CellKind, x: usize, y: usize, reward: Option<f64>) -> Self {
        let mut cell = Self {
            x,
            y,
            kind,
            reward: if kind == CellKind::Forbidden { None } else { reward },
            value_history: Vec::new(),
            policy: None,
            action_values: [0.; 4],
            action_visits: [0; 4],
        };
        cell.clean_q();
        cell
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn reward(&self) -> Option<f64> {
        self.reward
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == CellKind::Terminal
    }

    pub fn is_forbidden(&self) -> bool {
        self.kind == CellKind::Forbidden
    }

    /// Cells that take part in the Bellman sweep and receive a policy.
    pub fn is_decision_cell(&self) -> bool {
        !self.is_terminal() && !self.is_forbidden()
    }

    /// Terminal cells report their fixed reward, everything else its latest
    /// recorded estimate.
    pub fn value(&self) -> Option<f64> {
        if self.is_terminal() {
            self.reward
        } else {
            self.value_history.last().copied()
        }
    }

    pub fn value_history(&self) -> &[f64] {
        &self.value_history
    }

    pub fn push_value(&mut self, value: f64) {
        self.value_history.push(value);
    }

    pub fn pop_value(&mut self) -> Option<f64> {
        self.value_history.pop()
    }

    /// Absolute change between the two latest estimates, if there are two.
    pub fn last_delta(&self) -> Option<f64> {
        match self.value_history.as_slice() {
            [.., prev, last] => Some((last - prev).abs()),
            _ => None,
        }
    }

    pub fn policy(&self) -> Option<Action> {
        self.policy
    }

    pub(crate) fn set_policy(&mut self, action: Option<Action>) {
        self.policy = action;
    }

    pub fn action_values(&self) -> &[f64; 4] {
        &self.action_values
    }

    pub fn action_value(&self, action: Action) -> f64 {
        self.action_values[action.index()]
    }

    pub(crate) fn set_action_value(&mut self, action: Action, value: f64) {
        self.action_values[action.index()] = value;
    }

    pub fn action_visits(&self) -> &[u64; 4] {
        &self.action_visits
    }

    /// Bumps the visit counter of `action` and returns the new count.
    pub(crate) fn visit(&mut self, action: Action) -> u64 {
        let count = &mut self.action_visits[action.index()];
        *count += 1;
        *count
    }

    pub fn max_action_value(&self) -> f64 {
        self.action_values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn optimal_action(&self) -> Action {
        argmax(&self.action_values)
    }

    pub(crate) fn clean_values(&mut self) {
        self.value_history.clear();
        self.policy = None;
    }

    /// Terminal cells start from their reward so that arriving at one backs
    /// the reward up into the departing cell.
    pub(crate) fn clean_q(&mut self) {
        let initial = if self.is_terminal() {
            self.reward.unwrap_or(0.)
        } else {
            0.
        };
        self.action_values = [initial; 4];
        self.action_visits = [0; 4];
    }
}
