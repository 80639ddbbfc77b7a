pub mod policy;
pub mod vi;

use super::Policy;
use crate::envs::cell::Action;
use crate::envs::grid_world::Position;
use crate::error::Result;
use crate::mdps::mdp_simulator::Weighted;

/// One outcome of a commanded action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: Position,
    pub probability: f64,
}

impl Weighted<Position> for Transition {
    fn s(&self) -> Position {
        self.next
    }

    fn p(&self) -> f64 {
        self.probability
    }
}

/// Markov Decision Process - Sutton & Barto 2018.
pub trait Mdp {
    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    /// The `[front, left, right, back]` outcomes of commanding `a` in `s`.
    fn transitions(&self, s: Position, a: Action) -> [Transition; 4];

    fn gamma(&self) -> f64;
}

pub trait MdpSolver<T>: Policy {
    fn v_star(&self, s: Position) -> Option<f64>;

    fn q_star(&self, s: Position, a: Action) -> Option<f64>;

    fn pi_star(&self, s: Position) -> Option<Action>;

    /// Runs until `theta` is reached or `num_iterations` sweeps are done,
    /// whichever comes first. Returns the solver's verdict and the sweep count.
    fn exec(&mut self, theta: Option<f64>, num_iterations: Option<usize>) -> Result<(T, usize)>;
}

/// Expected next-state value `Σ p_i * value(next_i)` of each action, in
/// canonical action order.
pub fn expected_values<M, F>(mdp: &M, s: Position, value: F) -> [f64; 4]
where
    M: Mdp + ?Sized,
    F: Fn(Position) -> f64,
{
    Action::ALL.map(|a| {
        mdp.transitions(s, a)
            .iter()
            .map(|t| t.probability * value(t.next))
            .sum::<f64>()
    })
}
