pub mod model_based;
pub mod model_free;

use crate::envs::cell::Action;
use crate::envs::grid_world::{GridWorld, Position};

/// Maps a board position to the action to take there. `None` for cells that
/// take no decision.
pub trait Policy {
    fn policy(&self, s: Position) -> Option<Action>;
}

/// The policy stored on the board by policy extraction.
impl Policy for GridWorld {
    fn policy(&self, s: Position) -> Option<Action> {
        self.field(s).and_then(|c| c.policy())
    }
}
