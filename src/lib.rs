//! Grid-world Markov Decision Processes: model-based value iteration with
//! greedy policy extraction, and a model-free Q-learning agent that works
//! from sampled transitions only.

pub mod algos;
pub mod config;
pub mod envs;
pub mod error;
pub mod mdps;
pub mod report;

pub use algos::model_based::{policy::calculate_policy, vi::ValueIteration, Mdp, MdpSolver};
pub use algos::model_free::q_learning::{GreedyQPolicy, QLearningAgent, Selection};
pub use algos::Policy;
pub use config::{BoardDescription, StateOverride};
pub use envs::board::{BoardBuilder, CellOverride};
pub use envs::cell::{Action, Cell, CellKind};
pub use envs::grid_world::{GridWorld, Position};
pub use error::{Error, Result};
