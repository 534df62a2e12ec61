//! Composes the grid, signals, population, barriers, and spawner into the
//! generation/step loop (section 4.13), owning the single reproducible PRNG.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::actions::{self, QueuedEffects};
use crate::agent::Agent;
use crate::barriers;
use crate::color::genome_to_color;
use crate::config::{SimParams, SimParamsPatch};
use crate::coord::Coord;
use crate::error::SimError;
use crate::gene::{genetic_diversity, make_random_genome, Genome};
use crate::grid::Grid;
use crate::network::NeuralNet;
use crate::population::Population;
use crate::rng::Prng;
use crate::sensors::{self};
use crate::signals::Signals;
use crate::spawner::{spawn_generation, Candidate};
use crate::survival::evaluate_survivors;

/// Maximum number of failed random-cell draws the placement pass spends
/// before giving up and leaving the rest of the population unplaced (section
/// 7 "exhausted placement attempts").
const MAX_PLACEMENT_ATTEMPTS: u32 = 10_000;

/// Derives each placed agent's color from its genome. Pure and
/// per-genome-independent, so with the `parallel` feature this fans out
/// across `rayon`'s global pool; without it, a plain sequential map.
#[cfg(feature = "parallel")]
fn derive_colors(placed: &[(usize, Coord, Genome)]) -> Vec<(usize, (u8, u8, u8))> {
    use rayon::prelude::*;
    placed
        .par_iter()
        .map(|(index, _loc, genome)| (*index, genome_to_color(genome)))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn derive_colors(placed: &[(usize, Coord, Genome)]) -> Vec<(usize, (u8, u8, u8))> {
    placed
        .iter()
        .map(|(index, _loc, genome)| (*index, genome_to_color(genome)))
        .collect()
}

/// Summary statistics computed at the end of a generation, returned by
/// `endGeneration` and accumulated into `history`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u32,
    pub population: usize,
    pub survivors: usize,
    pub survival_rate: f64,
    pub genetic_diversity: f64,
    pub avg_genome_length: f64,
    pub min_genome_length: usize,
    pub max_genome_length: usize,
    pub kill_deaths: u32,
}

/// Minimal per-agent info returned by `inspect`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub index: usize,
    pub loc: Coord,
    pub age: u32,
    pub responsiveness: f32,
    pub osc_period: u32,
    pub long_probe_dist: u32,
    pub genome_length: usize,
}

/// The simulation core: grid, signals, population, config, and the single
/// reproducible PRNG. Does not itself track `running`/`paused`/speed — that
/// scheduling state belongs to the host-facing [`crate::engine::Engine`].
pub struct Simulator {
    config: SimParams,
    rng: Prng,
    grid: Grid,
    signals: Signals,
    population: Population,
    colors: Vec<(u8, u8, u8)>,
    generation: u32,
    sim_step: u32,
    history: Vec<GenerationStats>,
    kill_deaths_this_generation: u32,
}

impl Simulator {
    /// Constructs and initializes a simulator from `config`. Equivalent to
    /// `new` followed by `init` in the spec's terms, folded into one call
    /// since there is no useful uninitialized state to expose.
    pub fn new(config: SimParams) -> Result<Self, SimError> {
        config.validate()?;

        let mut sim = Self {
            rng: Prng::new(config.rng_seed),
            grid: Grid::new(config.size_x, config.size_y),
            signals: Signals::new(config.size_x, config.size_y, config.signal_layers),
            population: Population::default(),
            colors: Vec::new(),
            generation: 0,
            sim_step: 0,
            history: Vec::new(),
            kill_deaths_this_generation: 0,
            config,
        };
        sim.init();
        Ok(sim)
    }

    pub fn config(&self) -> &SimParams {
        &self.config
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn sim_step(&self) -> u32 {
        self.sim_step
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    pub fn agents(&self) -> &[Agent] {
        &self.population.agents
    }

    pub fn colors(&self) -> &[(u8, u8, u8)] {
        &self.colors
    }

    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    /// Resets counters/history, clears the grid and signals, stamps
    /// barriers, and places a fresh, randomly-genomed population. This is
    /// the PRNG-consumption entry point: barrier creation, then placement
    /// and genome generation, in that order (section 9).
    #[instrument(skip(self))]
    pub fn init(&mut self) {
        self.generation = 0;
        self.sim_step = 0;
        self.history.clear();
        self.kill_deaths_this_generation = 0;
        self.grid.clear();
        self.signals.clear();

        barriers::generate(&mut self.grid, self.config.barrier_type, &mut self.rng);

        let genomes: Vec<Genome> = (0..self.config.population)
            .map(|_| {
                let len = self.rng.next_range(
                    self.config.genome_initial_length_min as i64,
                    self.config.genome_initial_length_max as i64,
                );
                make_random_genome(len.max(1) as usize, &mut self.rng)
            })
            .collect();

        self.place_generation(genomes);
    }

    /// Reconstructs the simulator in place from `new_config` (or the current
    /// config if `None`), leaving state untouched if validation fails.
    pub fn reset(&mut self, new_config: Option<SimParams>) -> Result<(), SimError> {
        let config = new_config.unwrap_or_else(|| self.config.clone());
        config.validate()?;

        self.config = config;
        self.rng = Prng::new(self.config.rng_seed);
        self.grid = Grid::new(self.config.size_x, self.config.size_y);
        self.signals = Signals::new(self.config.size_x, self.config.size_y, self.config.signal_layers);
        self.init();
        Ok(())
    }

    /// Merges `patch` into the live config. If the patch changes grid shape
    /// or barrier layout, performs an implicit [`Simulator::reset`] with the
    /// merged config (section 10.4); otherwise just updates `self.config` in
    /// place.
    pub fn update_params(&mut self, patch: &SimParamsPatch) -> Result<(), SimError> {
        let merged = patch.apply(&self.config);
        merged.validate()?;

        if patch.requires_reset(&self.config) {
            return self.reset(Some(merged));
        }

        self.config = merged;
        Ok(())
    }

    /// Places `genomes.len()` fresh agents (one per genome) at random empty
    /// cells, building each agent's network and color. Stops early if the
    /// shared attempt budget is exhausted (section 7), leaving the rest of
    /// `genomes` unplaced.
    fn place_generation(&mut self, genomes: Vec<Genome>) {
        // Placement itself stays strictly serial: each draw consumes the
        // shared PRNG and depends on the grid state left by the previous
        // draw, so the order is part of the reproducible stream. Only the
        // per-genome color derivation below (pure, independent per agent) is
        // a candidate for the `parallel` feature.
        let mut placed: Vec<(usize, Coord, Genome)> = Vec::with_capacity(genomes.len());
        let mut attempts = 0u32;
        let mut next_index = 1usize;

        for genome in genomes {
            let mut placed_at = None;
            while attempts < MAX_PLACEMENT_ATTEMPTS {
                let x = self.rng.next_int(self.config.size_x.max(1) as u32) as i32;
                let y = self.rng.next_int(self.config.size_y.max(1) as u32) as i32;
                attempts += 1;
                let c = Coord::new(x, y);
                if self.grid.is_empty(c) {
                    placed_at = Some(c);
                    break;
                }
            }

            let Some(loc) = placed_at else {
                warn!(
                    attempts,
                    placed = placed.len(),
                    requested = self.config.population,
                    "placement attempts exhausted; continuing with fewer agents"
                );
                break;
            };

            self.grid.set(loc, next_index as u16);
            placed.push((next_index, loc, genome));
            next_index += 1;
        }

        let mut colors = vec![(0u8, 0u8, 0u8); placed.len() + 1];
        for (index, color) in derive_colors(&placed) {
            colors[index] = color;
        }

        let agents = placed
            .into_iter()
            .map(|(index, loc, genome)| {
                Agent::new(
                    index,
                    loc,
                    genome,
                    self.config.max_number_neurons,
                    self.config.long_probe_distance,
                )
            })
            .collect();

        self.colors = colors;
        self.population.set_agents(agents);
    }

    /// Advances exactly one simulation step: every living agent senses,
    /// decides, and queues its effects (ascending index order); then deaths
    /// drain, moves drain, signals fade, and `simStep` increments. Atomic
    /// from the host's perspective — nothing suspends mid-step.
    #[instrument(skip(self))]
    pub fn step_once(&mut self) {
        // A snapshot taken once at step-start: every sensor/action reads
        // other agents through this, never through the live population,
        // so no agent can observe another's in-step effects (section 5).
        // Grid itself needs no such snapshot — moves/deaths are queued and
        // only applied after this whole loop, so it stays step-start-valid.
        let agents_snapshot: Vec<Agent> = self.population.agents.clone();
        let indices: Vec<usize> = self.population.living().map(|a| a.index).collect();

        for index in indices {
            let sensor_world = sensors::World {
                grid: &self.grid,
                signals: &self.signals,
                agents: &agents_snapshot,
                config: &self.config,
                sim_step: self.sim_step,
            };
            let values =
                sensors::compute_all(self.population.agent(index), &sensor_world, &mut self.rng);

            let mut network = self.population.agent(index).network.clone();
            let levels = network.activate(&values);
            self.population.agent_mut(index).network = network;

            let action_world = actions::World {
                grid: &self.grid,
                agents: &agents_snapshot,
                config: &self.config,
            };

            let mut effects = QueuedEffects::default();
            let agent = self.population.agent_mut(index);
            actions::apply_actions(
                agent,
                &levels,
                &action_world,
                &mut self.signals,
                &mut self.rng,
                &mut effects,
            );
            agent.age += 1;

            self.population.enqueue(effects);
        }

        let kill_deaths = self.population.drain_queues(&mut self.grid);
        self.kill_deaths_this_generation += kill_deaths;
        self.signals.fade_all();
        self.sim_step += 1;

        trace!(sim_step = self.sim_step, kill_deaths, "step complete");
    }

    /// Runs `stepOnce` until `simStep` reaches `stepsPerGeneration`, then
    /// ends the generation. Returns `None` if the generation was already
    /// complete on entry (callers should check before calling, but this
    /// keeps the method total).
    pub fn run_generation(&mut self) -> GenerationStats {
        while self.sim_step < self.config.steps_per_generation {
            self.step_once();
        }
        self.end_generation()
    }

    /// Evaluates survivors, computes stats, spawns the next generation's
    /// genomes, and re-places them behind fresh barriers. This is the
    /// survival/spawn/replacement PRNG phase described in section 9.
    #[instrument(skip(self))]
    pub fn end_generation(&mut self) -> GenerationStats {
        let survivor_indices =
            evaluate_survivors(&self.population.agents, &self.grid, &self.config.survival_criteria);

        let living = self.population.living().count();
        let genomes: Vec<Genome> = self.population.agents.iter().map(|a| a.genome.clone()).collect();
        let diversity = genetic_diversity(&genomes, 100, &mut self.rng);

        let lengths: Vec<usize> = self.population.agents.iter().map(|a| a.genome.len()).collect();
        let (avg_len, min_len, max_len) = if lengths.is_empty() {
            (0.0, 0, 0)
        } else {
            let sum: usize = lengths.iter().sum();
            (
                sum as f64 / lengths.len() as f64,
                *lengths.iter().min().unwrap(),
                *lengths.iter().max().unwrap(),
            )
        };

        let stats = GenerationStats {
            generation: self.generation,
            population: self.config.population,
            survivors: survivor_indices.len(),
            survival_rate: if living == 0 {
                0.0
            } else {
                survivor_indices.len() as f64 / living as f64
            },
            genetic_diversity: diversity,
            avg_genome_length: avg_len,
            min_genome_length: min_len,
            max_genome_length: max_len,
            kill_deaths: self.kill_deaths_this_generation,
        };

        debug!(
            generation = stats.generation,
            survivors = stats.survivors,
            survival_rate = stats.survival_rate,
            "generation complete"
        );
        self.history.push(stats.clone());

        let grid_center = Coord::new(self.config.size_x / 2, self.config.size_y / 2);
        let survivor_set: std::collections::HashSet<usize> = survivor_indices.into_iter().collect();
        let candidates: Vec<Candidate> = self
            .population
            .agents
            .iter()
            .filter(|a| survivor_set.contains(&a.index))
            .map(|a| Candidate {
                genome: a.genome.clone(),
                loc: a.loc,
            })
            .collect();

        let genomes = spawn_generation(&candidates, &self.config, grid_center, &mut self.rng);

        self.grid.clear();
        self.signals.clear();
        barriers::generate(&mut self.grid, self.config.barrier_type, &mut self.rng);
        self.place_generation(genomes);

        self.generation += 1;
        self.sim_step = 0;
        self.kill_deaths_this_generation = 0;

        stats
    }

    /// Returns `(network, info)` for the agent occupying `(x, y)`, or `None`
    /// if the cell is empty, a barrier, or out of bounds (section 7 "inspect
    /// miss").
    pub fn inspect(&self, x: i32, y: i32) -> Option<(NeuralNet, AgentInfo)> {
        let c = Coord::new(x, y);
        if !self.grid.is_in_bounds(c) || !self.grid.is_occupied(c) {
            return None;
        }
        let cell = self.grid.at(c);
        let agent = &self.population.agents[(cell - 1) as usize];
        let info = AgentInfo {
            index: agent.index,
            loc: agent.loc,
            age: agent.age,
            responsiveness: agent.responsiveness,
            osc_period: agent.osc_period,
            long_probe_dist: agent.long_probe_dist,
            genome_length: agent.genome.len(),
        };
        Some((agent.network.clone(), info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survival::SurvivalCriterion;

    fn tiny_config() -> SimParams {
        let mut c = SimParams::default();
        c.population = 4;
        c.size_x = 8;
        c.size_y = 8;
        c.steps_per_generation = 5;
        c.rng_seed = 1;
        c
    }

    #[test]
    fn barrier_cells_never_move_across_a_step() {
        let mut config = tiny_config();
        config.barrier_type = crate::barriers::BarrierType::VerticalBarConstant;

        let mut sim = Simulator::new(config).unwrap();
        let barrier_cells: Vec<Coord> = (0..8)
            .flat_map(|x| (0..8).map(move |y| Coord::new(x, y)))
            .filter(|c| sim.grid().is_barrier(*c))
            .collect();
        assert!(!barrier_cells.is_empty());

        sim.step_once();
        for c in barrier_cells {
            assert!(sim.grid().is_barrier(c));
        }
    }

    #[test]
    fn run_generation_reaches_the_boundary_and_resets_sim_step() {
        let config = tiny_config();
        let mut sim = Simulator::new(config).unwrap();
        let stats = sim.run_generation();

        assert_eq!(sim.sim_step(), 0);
        assert_eq!(sim.generation(), 1);
        assert_eq!(stats.generation, 0);
        assert_eq!(sim.history().len(), 1);
    }

    #[test]
    fn end_to_end_reproducibility_across_several_generations() {
        let mut config = tiny_config();
        config.survival_criteria = vec![SurvivalCriterion::RightEighth];

        let mut a = Simulator::new(config.clone()).unwrap();
        let mut b = Simulator::new(config).unwrap();

        for _ in 0..3 {
            a.run_generation();
            b.run_generation();
        }

        assert_eq!(a.grid().to_bytes(), b.grid().to_bytes());
        assert_eq!(a.generation(), b.generation());
        assert_eq!(a.history(), b.history());
    }

    #[test]
    fn inspect_misses_on_an_empty_cell() {
        let mut config = tiny_config();
        config.population = 0;
        let sim = Simulator::new(config).unwrap();
        assert!(sim.inspect(0, 0).is_none());
    }
}
