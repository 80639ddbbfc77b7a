use super::expected_values;
use crate::envs::cell::{argmax, Action, Cell};
use crate::envs::grid_world::{GridWorld, Position};
use tracing::debug;

/// Greedy action of `s` under the board's current value estimates. Cells
/// without an estimate are read as `initial_value`.
pub fn greedy_action(world: &GridWorld, s: Position, initial_value: f64) -> Action {
    let ev = expected_values(world, s, |next| {
        world
            .field(next)
            .and_then(Cell::value)
            .unwrap_or(initial_value)
    });
    argmax(&ev)
}

/// Stores the greedy action on every decision cell and clears it everywhere
/// else. Returns the number of cells that received an action.
pub fn calculate_policy(world: &mut GridWorld, initial_value: f64) -> usize {
    let choices = {
        let w: &GridWorld = world;
        w.decision_positions()
            .into_iter()
            .map(|s| (s, greedy_action(w, s, initial_value)))
            .collect::<Vec<_>>()
    };

    world.all_fields_mut().for_each(|c| c.set_policy(None));
    for &(s, a) in &choices {
        if let Some(cell) = world.field_mut(s) {
            cell.set_policy(Some(a));
        }
    }

    debug!(cells = choices.len(), "policy extracted");
    choices.len()
}
