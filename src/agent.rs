//! Per-individual state: location, genome, built network, and the small
//! amount of mutable state (age, responsiveness, oscillator period,
//! long-probe distance) its own actions can change mid-generation.

use crate::coord::{Coord, Direction};
use crate::gene::Genome;
use crate::network::NeuralNet;

/// One creature. `index` is 1-based and stable for the agent's lifetime
/// (reassigned fresh every generation); index `0` is reserved as the grid's
/// "empty" sentinel, never a valid agent index.
#[derive(Clone, Debug)]
pub struct Agent {
    pub index: usize,
    pub alive: bool,
    pub loc: Coord,
    pub birth_loc: Coord,
    pub last_move_dir: Direction,
    pub genome: Genome,
    pub network: NeuralNet,
    pub age: u32,
    pub responsiveness: f32,
    pub osc_period: u32,
    pub long_probe_dist: u32,
}

impl Agent {
    /// Builds a freshly-born agent at `loc` from `genome`, with every
    /// per-lifetime field at its documented initial value.
    pub fn new(
        index: usize,
        loc: Coord,
        genome: Genome,
        max_internal_neurons: usize,
        default_long_probe_dist: u32,
    ) -> Self {
        let network = NeuralNet::build(&genome, max_internal_neurons);
        Self {
            index,
            alive: true,
            loc,
            birth_loc: loc,
            last_move_dir: Direction::Center,
            genome,
            network,
            age: 0,
            responsiveness: 0.5,
            osc_period: 34,
            long_probe_dist: default_long_probe_dist.max(1),
        }
    }
}
