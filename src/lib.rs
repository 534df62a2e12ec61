#![warn(missing_docs)]

//! A 2D evolution simulator core: a deterministic grid world of
//! genome-driven agents that sense, act, reproduce, and mutate across
//! generations.
//!
//! [`Simulator`] owns the whole reproducible simulation state; [`Engine`]
//! wraps it with the host-facing command/event boundary. Everything in
//! between — PRNG, genome codec, neural-net builder, sensors, actions,
//! barriers, survival, and spawning — is exposed as its own module so each
//! piece can be tested in isolation.

/// Agent actions: the 17 effector operations a neural network can drive.
pub mod actions;
/// The living agent: location, genome, network, and per-step state.
pub mod agent;
/// Grid barrier patterns stamped before each generation's placement.
pub mod barriers;
/// Genome-to-RGB coloring for the `state` snapshot's color buffer.
pub mod color;
/// Simulation configuration and its partial-update patch type.
pub mod config;
/// Integer grid coordinates and the nine compass directions.
pub mod coord;
/// The host-facing command/event boundary and scheduling state.
pub mod engine;
/// Structured errors for the command boundary.
pub mod error;
/// The packed-32-bit gene codec and genetic operators.
pub mod gene;
/// The 2D occupancy grid.
pub mod grid;
/// The feed-forward neural network built from a genome.
pub mod network;
/// The live agent array and its per-step move/death queues.
pub mod population;
/// Used to quickly import everything this crate has to offer.
/// Simply add `use evolution_core::prelude::*` to begin using this crate.
pub mod prelude;
/// Deterministic PRNG: SplitMix32 seeding plus xoshiro128**.
pub mod rng;
/// Agent sensors: the 21 scalar-valued inputs to a neural network.
pub mod sensors;
/// Produces the next generation's genomes from this generation's survivors.
pub mod spawner;
/// Pheromone signal layers.
pub mod signals;
/// Composes the grid, signals, population, and spawner into the
/// generation/step loop.
pub mod simulator;
/// Survival criteria evaluated at generation end.
pub mod survival;

pub use engine::{Command, Engine, Event, StateSnapshot};
pub use error::SimError;
pub use simulator::{AgentInfo, GenerationStats, Simulator};

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn a_default_simulator_initializes_and_steps() {
        let mut sim = Simulator::new(config::SimParams::default()).unwrap();
        sim.step_once();
        assert_eq!(sim.sim_step(), 1);
    }
}
