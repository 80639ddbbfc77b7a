use super::{expected_values, Mdp, MdpSolver};
use crate::algos::Policy;
use crate::envs::cell::{Action, Cell};
use crate::envs::grid_world::{GridWorld, Position};
use crate::error::{Error, Result};
use tracing::{debug, info};

pub const DEFAULT_INITIAL_VALUE: f64 = 0.;

/// Synchronous (Jacobi) value iteration over a grid world.
///
/// Estimates live in each cell's value history. A cell read before it has
/// any estimate gets `initial_value` recorded as its first entry.
pub struct ValueIteration<'w> {
    world: &'w mut GridWorld,
    initial_value: f64,
}

impl<'w> ValueIteration<'w> {
    pub fn new(world: &'w mut GridWorld) -> Self {
        Self::with_initial_value(world, DEFAULT_INITIAL_VALUE)
    }

    pub fn with_initial_value(world: &'w mut GridWorld, initial_value: f64) -> Self {
        Self {
            world,
            initial_value,
        }
    }

    pub fn world(&self) -> &GridWorld {
        self.world
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    fn seed(&mut self, s: Position) {
        if let Some(cell) = self.world.field_mut(s) {
            if cell.is_decision_cell() && cell.value().is_none() {
                cell.push_value(self.initial_value);
            }
        }
    }

    fn read(&self, s: Position) -> f64 {
        self.world
            .field(s)
            .and_then(Cell::value)
            .unwrap_or(self.initial_value)
    }

    fn reward(&self, s: Position) -> f64 {
        self.world
            .field(s)
            .and_then(Cell::reward)
            .unwrap_or_default()
    }

    /// One Bellman sweep. Every new estimate is computed from the previous
    /// sweep's values before any of them is committed.
    pub fn sweep(&mut self) {
        let positions = self.world.decision_positions();
        let gamma = self.world.gamma();

        let mut updates = Vec::with_capacity(positions.len());
        for &s in &positions {
            for a in Action::ALL {
                for t in self.world.transitions(s, a) {
                    self.seed(t.next);
                }
            }

            let best = expected_values(&*self.world, s, |next| self.read(next))
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max);
            updates.push((s, self.reward(s) + gamma * best));
        }

        for (s, v) in updates {
            if let Some(cell) = self.world.field_mut(s) {
                cell.push_value(v);
            }
        }
    }

    /// Largest change between the two latest estimates of any decision cell.
    /// A cell with fewer than two estimates counts as infinitely far off.
    pub fn max_delta(&self) -> f64 {
        self.world
            .all_fields()
            .filter(|c| c.is_decision_cell())
            .map(|c| c.last_delta().unwrap_or(f64::INFINITY))
            .fold(0., f64::max)
    }

    pub fn is_converged(&self, theta: f64) -> bool {
        self.max_delta() < theta
    }
}

impl Policy for ValueIteration<'_> {
    fn policy(&self, s: Position) -> Option<Action> {
        self.pi_star(s)
    }
}

impl MdpSolver<bool> for ValueIteration<'_> {
    fn v_star(&self, s: Position) -> Option<f64> {
        self.world.field(s).and_then(Cell::value)
    }

    fn q_star(&self, s: Position, a: Action) -> Option<f64> {
        if !self.world.field(s)?.is_decision_cell() {
            return None;
        }

        let ev = expected_values(&*self.world, s, |next| self.read(next));
        Some(self.reward(s) + self.world.gamma() * ev[a.index()])
    }

    /// The extracted policy, `None` until policy extraction has run.
    fn pi_star(&self, s: Position) -> Option<Action> {
        self.world.field(s).and_then(Cell::policy)
    }

    fn exec(&mut self, theta: Option<f64>, num_iterations: Option<usize>) -> Result<(bool, usize)> {
        if theta.is_none() && num_iterations.is_none() {
            return Err(Error::NoTerminationCriterion);
        }
        if let Some(value) = theta.filter(|t| !(t.is_finite() && *t > 0.)) {
            return Err(Error::InvalidThreshold { value });
        }

        let mut sweeps = 0;
        let converged = loop {
            if let Some(theta) = theta {
                if self.is_converged(theta) {
                    break true;
                }
            }
            if num_iterations.map_or(false, |n| sweeps >= n) {
                break false;
            }

            self.sweep();
            sweeps += 1;
            debug!(sweep = sweeps, max_delta = self.max_delta(), "value iteration sweep");
        };

        info!(
            world = self.world.title(),
            sweeps, converged, "value iteration finished"
        );
        Ok((converged, sweeps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::board::{BoardBuilder, CellOverride};
    use float_eq::*;
    use rstest::rstest;

    fn default_world() -> GridWorld {
        let cells = BoardBuilder::new(4, 3, -0.04)
            .with_override(CellOverride::new("S", 0, 0, None))
            .with_override(CellOverride::new("T", 3, 2, Some(1.)))
            .with_override(CellOverride::new("T", 3, 1, Some(-1.)))
            .with_override(CellOverride::new("F", 1, 1, None))
            .build()
            .unwrap();
        GridWorld::new("default", cells, 1., 0.2, [0.8, 0.1, 0.1, 0.]).unwrap()
    }

    fn history(world: &GridWorld, x: usize, y: usize) -> Vec<f64> {
        world
            .field(Position::new(x, y))
            .unwrap()
            .value_history()
            .to_vec()
    }

    #[test]
    fn requires_termination_criterion() {
        let world = &mut default_world();
        let ret = ValueIteration::new(world).exec(None, None);
        assert!(matches!(ret, Err(Error::NoTerminationCriterion)));
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(-1.)]
    #[case(0.)]
    #[case(f64::INFINITY)]
    fn rejects_unusable_threshold(#[case] theta: f64) {
        let world = &mut default_world();
        let ret = ValueIteration::new(world).exec(Some(theta), Some(50));
        assert!(matches!(ret, Err(Error::InvalidThreshold { .. })));
        assert!(world.all_fields().all(|c| c.value_history().is_empty()));
    }

    #[test]
    fn first_sweep_records_initial_values() {
        let world = &mut default_world();
        ValueIteration::new(world).sweep();

        assert_float_eq!(history(world, 2, 2), vec![0., 0.76], abs_all <= 1e-12);
        assert_float_eq!(history(world, 0, 0), vec![0., -0.04], abs_all <= 1e-12);
        assert_float_eq!(history(world, 3, 0), vec![0., -0.04], abs_all <= 1e-12);
        assert!(history(world, 3, 2).is_empty());
        assert!(history(world, 1, 1).is_empty());
    }

    #[test]
    fn initial_value_is_configurable() {
        let world = &mut default_world();
        ValueIteration::with_initial_value(world, 0.5).sweep();

        assert_float_eq!(history(world, 0, 0)[0], 0.5, abs <= 1e-12);
        assert_float_eq!(history(world, 0, 0)[1], 0.46, abs <= 1e-12);
    }

    #[test]
    fn fixed_count_is_deterministic() {
        let w1 = &mut default_world();
        let w2 = &mut default_world();
        assert_eq!(ValueIteration::new(w1).exec(None, Some(10)).unwrap(), (false, 10));
        assert_eq!(ValueIteration::new(w2).exec(None, Some(10)).unwrap(), (false, 10));

        let h1 = w1.all_fields().map(|c| c.value_history().to_vec()).collect::<Vec<_>>();
        let h2 = w2.all_fields().map(|c| c.value_history().to_vec()).collect::<Vec<_>>();
        assert_eq!(h1, h2);
    }

    #[test]
    fn convergence_agrees_with_fixed_count() {
        let theta = 1e-4;
        let w1 = &mut default_world();
        let w2 = &mut default_world();

        let (converged, sweeps) = ValueIteration::new(w1).exec(Some(theta), None).unwrap();
        assert!(converged);
        assert_eq!(sweeps, 22);

        ValueIteration::new(w2).exec(None, Some(100)).unwrap();
        for s in w1.decision_positions() {
            let v1 = w1.field(s).unwrap().value().unwrap();
            let v2 = w2.field(s).unwrap().value().unwrap();
            assert_float_eq!(v1, v2, abs <= 1e-3);
        }
    }

    #[test]
    fn iteration_count_caps_convergence_run() {
        let world = &mut default_world();
        let ret = ValueIteration::new(world).exec(Some(1e-4), Some(5)).unwrap();
        assert_eq!(ret, (false, 5));
    }

    #[test]
    fn single_estimate_is_not_converged() {
        // The centre cell only leads to terminal cells, so nothing reads it
        // and its first sweep leaves a single estimate.
        let cells = BoardBuilder::new(3, 3, -0.04)
            .with_override(CellOverride::new("F", 0, 0, None))
            .with_override(CellOverride::new("F", 2, 0, None))
            .with_override(CellOverride::new("F", 0, 2, None))
            .with_override(CellOverride::new("F", 2, 2, None))
            .with_override(CellOverride::new("T", 1, 0, Some(0.)))
            .with_override(CellOverride::new("T", 0, 1, Some(0.)))
            .with_override(CellOverride::new("T", 2, 1, Some(0.)))
            .with_override(CellOverride::new("T", 1, 2, Some(1.)))
            .build()
            .unwrap();
        let world = &mut GridWorld::new("cross", cells, 1., 0., [1., 0., 0., 0.]).unwrap();

        let vi = &mut ValueIteration::new(world);
        vi.sweep();
        assert_eq!(vi.world().field(Position::new(1, 1)).unwrap().value_history().len(), 1);
        assert!(!vi.is_converged(f64::MAX));

        assert_eq!(vi.exec(Some(1e-9), None).unwrap(), (true, 1));
        assert_float_eq!(vi.v_star(Position::new(1, 1)).unwrap(), 0.96, abs <= 1e-12);
    }

    #[test]
    fn q_star_and_v_star() {
        let world = &mut default_world();
        let vi = &mut ValueIteration::new(world);
        vi.exec(Some(1e-6), None).unwrap();

        assert_eq!(vi.v_star(Position::new(3, 2)), Some(1.));
        assert_eq!(vi.q_star(Position::new(3, 2), Action::Up), None);
        assert_eq!(vi.q_star(Position::new(1, 1), Action::Up), None);

        let s = Position::new(2, 2);
        let best = Action::ALL
            .iter()
            .map(|&a| vi.q_star(s, a).unwrap())
            .fold(f64::NEG_INFINITY, f64::max);
        assert_float_eq!(best, vi.v_star(s).unwrap(), abs <= 1e-5);
        assert_eq!(vi.pi_star(s), None);
    }
}
