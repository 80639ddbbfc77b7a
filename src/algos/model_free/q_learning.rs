use crate::algos::model_based::Mdp;
use crate::algos::Policy;
use crate::envs::cell::Action;
use crate::envs::grid_world::{GridWorld, Position};
use crate::error::{Error, Result};
use rand::prelude::*;
use tracing::{info, trace};

/// Outcome of the epsilon-greedy draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Exploit(Action),
    Explore(Action),
}

impl Selection {
    pub fn action(self) -> Action {
        match self {
            Selection::Exploit(a) | Selection::Explore(a) => a,
        }
    }

    pub fn is_exploration(self) -> bool {
        matches!(self, Selection::Explore(_))
    }
}

/// Tabular Q-learning with sample-average step sizes (`1 / visits`).
///
/// Action values and visit counters live on the board's cells and carry
/// over between episodes and between calls to [`QLearningAgent::learning`].
pub struct QLearningAgent<'w, R: Rng = StdRng> {
    world: &'w mut GridWorld,
    rng: R,
    start: Position,
}

impl<'w> QLearningAgent<'w, StdRng> {
    /// Seeded agents are reproducible. Without a seed the RNG is drawn from
    /// system entropy.
    pub fn new(world: &'w mut GridWorld, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(world, rng)
    }
}

impl<'w, R: Rng> QLearningAgent<'w, R> {
    pub fn with_rng(world: &'w mut GridWorld, rng: R) -> Result<Self> {
        let start = world.start_field().ok_or(Error::MissingStartCell)?;
        if !world.all_fields().any(|c| c.is_terminal()) {
            return Err(Error::MissingTerminalCell);
        }

        Ok(Self { world, rng, start })
    }

    pub fn world(&self) -> &GridWorld {
        self.world
    }

    /// Runs `episodes` episodes from the start cell, returning the total
    /// number of steps taken.
    pub fn learning(&mut self, episodes: usize) -> Result<usize> {
        let mut total = 0;
        for episode in 0..episodes {
            let steps = self.episode()?;
            trace!(episode, steps, "episode finished");
            total += steps;
        }

        info!(
            world = self.world.title(),
            episodes,
            steps = total,
            epsilon = self.world.epsilon(),
            "q-learning finished"
        );
        Ok(total)
    }

    /// One episode from the start cell until a terminal cell is reached.
    pub fn episode(&mut self) -> Result<usize> {
        let gamma = self.world.gamma();
        let mut s = self.start;
        let mut steps = 0;

        while !self.world[s].is_terminal() {
            let greedy = self.world[s].optimal_action();
            let a = self.select_exploration_or_exploitation(greedy).action();
            let next = self.world.agent_move(&mut self.rng, s, a)?;

            let target = self.world[s].reward().unwrap_or_default()
                + gamma * self.world[next].max_action_value();
            let cell = &mut self.world[s];
            let alpha = 1. / cell.visit(a) as f64;
            let q = cell.action_value(a);
            cell.set_action_value(a, q + alpha * (target - q));

            s = next;
            steps += 1;
        }

        Ok(steps)
    }

    /// With probability epsilon a uniformly random action, otherwise `optimal`.
    /// Drawn independently on every call.
    pub fn select_exploration_or_exploitation(&mut self, optimal: Action) -> Selection {
        if self.rng.gen::<f64>() < self.world.epsilon() {
            Selection::Explore(self.random_action())
        } else {
            Selection::Exploit(optimal)
        }
    }

    pub fn random_action(&mut self) -> Action {
        Action::ALL[self.rng.gen_range(0..Action::ALL.len())]
    }
}

/// Greedy policy over the action values stored on a board.
pub struct GreedyQPolicy<'a> {
    pub world: &'a GridWorld,
}

impl Policy for GreedyQPolicy<'_> {
    fn policy(&self, s: Position) -> Option<Action> {
        self.world
            .field(s)
            .filter(|c| c.is_decision_cell())
            .map(|c| c.optimal_action())
    }
}

impl<R: Rng> Policy for QLearningAgent<'_, R> {
    fn policy(&self, s: Position) -> Option<Action> {
        GreedyQPolicy { world: self.world }.policy(s)
    }
}
