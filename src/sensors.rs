//! The 21 sensors: pure scalar-valued functions of an agent and read-only
//! world state, each returning a value in `[0, 1]`.
//!
//! Sensors never mutate anything but the shared PRNG (only `Random` draws
//! from it); every other sensor reads the grid/signals/agent snapshot taken
//! at step-start, so no sensor can observe another agent's in-step action
//! effects (section 5).

use crate::agent::Agent;
use crate::config::SimParams;
use crate::coord::{Coord, Direction};
use crate::gene::genome_similarity;
use crate::grid::Grid;
use crate::rng::Prng;
use crate::signals::Signals;

/// The fixed sensor index order. IDs in genes are remapped modulo
/// `NUM_SENSORS`, so this order is part of the wire contract even though the
/// spec names sensors by behavior rather than integer ID (see `DESIGN.md`).
pub const NUM_SENSORS: usize = 21;

/// The signal layer every `Signal0*` sensor/action addresses.
const SIGNAL0_LAYER: usize = 0;

/// One of the 21 sensors, in their fixed index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Sensor {
    LocX = 0,
    LocY,
    BoundaryDistX,
    BoundaryDistY,
    BoundaryDist,
    LastMoveDirX,
    LastMoveDirY,
    GeneticSimFwd,
    LongprobePopFwd,
    LongprobeBarrierFwd,
    Population,
    PopulationFwd,
    PopulationLr,
    Osc1,
    Age,
    BarrierFwd,
    BarrierLr,
    Random,
    Signal0,
    Signal0Fwd,
    Signal0Lr,
}

/// All sensors, in index order. Kept in sync with `NUM_SENSORS`.
pub const ALL: [Sensor; NUM_SENSORS] = [
    Sensor::LocX,
    Sensor::LocY,
    Sensor::BoundaryDistX,
    Sensor::BoundaryDistY,
    Sensor::BoundaryDist,
    Sensor::LastMoveDirX,
    Sensor::LastMoveDirY,
    Sensor::GeneticSimFwd,
    Sensor::LongprobePopFwd,
    Sensor::LongprobeBarrierFwd,
    Sensor::Population,
    Sensor::PopulationFwd,
    Sensor::PopulationLr,
    Sensor::Osc1,
    Sensor::Age,
    Sensor::BarrierFwd,
    Sensor::BarrierLr,
    Sensor::Random,
    Sensor::Signal0,
    Sensor::Signal0Fwd,
    Sensor::Signal0Lr,
];

/// Read-only world state a sensor needs, borrowed for the duration of one
/// agent's sense-decide-act turn.
pub struct World<'a> {
    pub grid: &'a Grid,
    pub signals: &'a Signals,
    pub agents: &'a [Agent],
    pub config: &'a SimParams,
    pub sim_step: u32,
}

/// Walks `max_dist` cells from `start` along unit direction `dir`, counting
/// occupied cells, stopping early at the first barrier or out-of-bounds
/// cell.
fn probe_population_count(grid: &Grid, start: Coord, dir: Coord, max_dist: u32) -> u32 {
    let mut count = 0;
    for d in 1..=max_dist as i32 {
        let c = Coord::new(start.x + dir.x * d, start.y + dir.y * d);
        if !grid.is_in_bounds(c) || grid.is_barrier(c) {
            break;
        }
        if grid.is_occupied(c) {
            count += 1;
        }
    }
    count
}

/// Walks `max_dist` cells from `start` along unit direction `dir`, returning
/// the first distance at which a barrier or the grid boundary is hit, or
/// `None` if nothing is hit within range.
fn probe_first_barrier_distance(grid: &Grid, start: Coord, dir: Coord, max_dist: u32) -> Option<u32> {
    for d in 1..=max_dist as i32 {
        let c = Coord::new(start.x + dir.x * d, start.y + dir.y * d);
        if !grid.is_in_bounds(c) || grid.is_barrier(c) {
            return Some(d as u32);
        }
    }
    None
}

fn right_of(fwd: Direction) -> Direction {
    fwd.rotate_90_cw()
}

fn left_of(fwd: Direction) -> Direction {
    fwd.rotate_90_ccw()
}

/// Evaluates `sensor` for `agent` against `world`. `rng` is only consumed by
/// [`Sensor::Random`].
pub fn compute(sensor: Sensor, agent: &Agent, world: &World, rng: &mut Prng) -> f32 {
    let size_x = world.grid.size_x();
    let size_y = world.grid.size_y();
    let loc = agent.loc;
    let fwd_dir = agent.last_move_dir;
    let fwd = fwd_dir.as_unit_coord();

    match sensor {
        Sensor::LocX => {
            if size_x <= 1 {
                0.0
            } else {
                loc.x as f32 / (size_x - 1) as f32
            }
        }
        Sensor::LocY => {
            if size_y <= 1 {
                0.0
            } else {
                loc.y as f32 / (size_y - 1) as f32
            }
        }
        Sensor::BoundaryDistX => {
            let half = size_x as f32 / 2.0;
            if half == 0.0 {
                0.0
            } else {
                (loc.x.min(size_x - 1 - loc.x) as f32 / half).clamp(0.0, 1.0)
            }
        }
        Sensor::BoundaryDistY => {
            let half = size_y as f32 / 2.0;
            if half == 0.0 {
                0.0
            } else {
                (loc.y.min(size_y - 1 - loc.y) as f32 / half).clamp(0.0, 1.0)
            }
        }
        Sensor::BoundaryDist => {
            let denom = size_x.min(size_y) as f32 / 2.0;
            if denom == 0.0 {
                0.0
            } else {
                let dx = loc.x.min(size_x - 1 - loc.x) as f32;
                let dy = loc.y.min(size_y - 1 - loc.y) as f32;
                (dx.min(dy) / denom).clamp(0.0, 1.0)
            }
        }
        Sensor::LastMoveDirX => (fwd.x as f32 + 1.0) / 2.0,
        Sensor::LastMoveDirY => (fwd.y as f32 + 1.0) / 2.0,

        Sensor::GeneticSimFwd => {
            let target = loc.add(fwd);
            if !world.grid.is_in_bounds(target) {
                return 0.0;
            }
            let cell = world.grid.at(target);
            if cell == crate::grid::EMPTY_CELL || cell == crate::grid::BARRIER_CELL {
                return 0.0;
            }
            let other = &world.agents[(cell - 1) as usize];
            if !other.alive {
                return 0.0;
            }
            genome_similarity(&agent.genome, &other.genome) as f32
        }

        Sensor::LongprobePopFwd => {
            if matches!(fwd_dir, Direction::Center) {
                return 0.0;
            }
            let max_dist = agent.long_probe_dist;
            let count = probe_population_count(world.grid, loc, fwd, max_dist);
            (count as f32 / max_dist.max(1) as f32).min(1.0)
        }

        Sensor::LongprobeBarrierFwd => {
            if matches!(fwd_dir, Direction::Center) {
                return 1.0;
            }
            let max_dist = agent.long_probe_dist;
            match probe_first_barrier_distance(world.grid, loc, fwd, max_dist) {
                Some(d) => d as f32 / max_dist.max(1) as f32,
                None => 1.0,
            }
        }

        Sensor::Population => {
            let mut occupied = 0u32;
            let mut total = 0u32;
            world
                .grid
                .visit_neighborhood(loc, world.config.population_sensor_radius, |c| {
                    total += 1;
                    if world.grid.is_occupied(c) {
                        occupied += 1;
                    }
                });
            if total == 0 {
                0.0
            } else {
                occupied as f32 / total as f32
            }
        }

        Sensor::PopulationFwd => {
            if matches!(fwd_dir, Direction::Center) {
                return 0.0;
            }
            let max_dist = world.config.short_probe_barrier_distance;
            let count = probe_population_count(world.grid, loc, fwd, max_dist);
            (count as f32 / max_dist.max(1) as f32).min(1.0)
        }

        Sensor::PopulationLr => {
            let max_dist = world.config.short_probe_barrier_distance;
            let right = probe_population_count(world.grid, loc, right_of(fwd_dir).as_unit_coord(), max_dist);
            let left = probe_population_count(world.grid, loc, left_of(fwd_dir).as_unit_coord(), max_dist);
            if right + left == 0 {
                0.5
            } else {
                right as f32 / (right + left) as f32
            }
        }

        Sensor::Osc1 => {
            let period = agent.osc_period.max(2);
            let phase = (world.sim_step % period) as f64 / period as f64;
            ((2.0 * std::f64::consts::PI * phase).sin() + 1.0) as f32 / 2.0
        }

        Sensor::Age => {
            if world.config.steps_per_generation == 0 {
                0.0
            } else {
                agent.age as f32 / world.config.steps_per_generation as f32
            }
        }

        Sensor::BarrierFwd => {
            if matches!(fwd_dir, Direction::Center) {
                return 1.0;
            }
            let max_dist = world.config.short_probe_barrier_distance;
            match probe_first_barrier_distance(world.grid, loc, fwd, max_dist) {
                Some(d) => (1.0 - d as f32 / (max_dist as f32 + 1.0)).max(0.0),
                None => 0.0,
            }
        }

        Sensor::BarrierLr => {
            let max_dist = world.config.short_probe_barrier_distance;
            let right = probe_first_barrier_distance(world.grid, loc, right_of(fwd_dir).as_unit_coord(), max_dist)
                .is_some();
            let left = probe_first_barrier_distance(world.grid, loc, left_of(fwd_dir).as_unit_coord(), max_dist)
                .is_some();
            match (right, left) {
                (true, false) => 0.0,
                (false, true) => 1.0,
                _ => 0.5,
            }
        }

        Sensor::Random => rng.next01() as f32,

        Sensor::Signal0 => world
            .signals
            .get_signal_density(SIGNAL0_LAYER, loc, world.config.signal_sensor_radius, world.grid)
            as f32,

        Sensor::Signal0Fwd => {
            let target = loc.add(fwd);
            if !world.grid.is_in_bounds(target) {
                return 0.0;
            }
            world.signals.at(SIGNAL0_LAYER, target) as f32 / 255.0
        }

        Sensor::Signal0Lr => {
            let right = loc.add(right_of(fwd_dir).as_unit_coord());
            let left = loc.add(left_of(fwd_dir).as_unit_coord());
            let r = world.signals.at(SIGNAL0_LAYER, right) as f32;
            let l = world.signals.at(SIGNAL0_LAYER, left) as f32;
            if r + l == 0.0 {
                0.5
            } else {
                r / (r + l)
            }
        }
    }
}

/// Evaluates every sensor in index order, producing the fixed-length vector
/// fed into the agent's network.
pub fn compute_all(agent: &Agent, world: &World, rng: &mut Prng) -> Vec<f32> {
    ALL.iter().map(|s| compute(*s, agent, world, rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::gene::make_random_genome;

    fn default_world<'a>(
        grid: &'a Grid,
        signals: &'a Signals,
        agents: &'a [Agent],
        config: &'a SimParams,
    ) -> World<'a> {
        World {
            grid,
            signals,
            agents,
            config,
            sim_step: 0,
        }
    }

    #[test]
    fn loc_sensors_are_normalized() {
        let grid = Grid::new(9, 9);
        let signals = Signals::new(9, 9, 1);
        let config = SimParams::default();
        let mut rng = Prng::new(1);
        let genome = make_random_genome(4, &mut rng);
        let agent = Agent::new(1, Coord::new(8, 0), genome, 4, 16);
        let agents = [agent.clone()];
        let world = default_world(&grid, &signals, &agents, &config);

        assert_eq!(compute(Sensor::LocX, &agent, &world, &mut rng), 1.0);
        assert_eq!(compute(Sensor::LocY, &agent, &world, &mut rng), 0.0);
    }

    #[test]
    fn random_sensor_stays_in_unit_interval() {
        let grid = Grid::new(9, 9);
        let signals = Signals::new(9, 9, 1);
        let config = SimParams::default();
        let mut rng = Prng::new(2);
        let genome = make_random_genome(4, &mut rng);
        let agent = Agent::new(1, Coord::new(4, 4), genome, 4, 16);
        let agents = [agent.clone()];
        let world = default_world(&grid, &signals, &agents, &config);

        for _ in 0..100 {
            let v = compute(Sensor::Random, &agent, &world, &mut rng);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn barrier_fwd_defaults_to_one_when_no_heading() {
        let grid = Grid::new(9, 9);
        let signals = Signals::new(9, 9, 1);
        let config = SimParams::default();
        let mut rng = Prng::new(3);
        let genome = make_random_genome(4, &mut rng);
        let agent = Agent::new(1, Coord::new(4, 4), genome, 4, 16);
        let agents = [agent.clone()];
        let world = default_world(&grid, &signals, &agents, &config);

        assert_eq!(compute(Sensor::BarrierFwd, &agent, &world, &mut rng), 1.0);
    }

    #[test]
    fn population_lr_is_half_when_nothing_nearby() {
        let grid = Grid::new(9, 9);
        let signals = Signals::new(9, 9, 1);
        let config = SimParams::default();
        let mut rng = Prng::new(4);
        let genome = make_random_genome(4, &mut rng);
        let mut agent = Agent::new(1, Coord::new(4, 4), genome, 4, 16);
        agent.last_move_dir = Direction::North;
        let agents = [agent.clone()];
        let world = default_world(&grid, &signals, &agents, &config);

        assert_eq!(compute(Sensor::PopulationLr, &agent, &world, &mut rng), 0.5);
    }

    #[test]
    fn compute_all_returns_num_sensors_values_in_range() {
        let grid = Grid::new(9, 9);
        let signals = Signals::new(9, 9, 1);
        let config = SimParams::default();
        let mut rng = Prng::new(5);
        let genome = make_random_genome(4, &mut rng);
        let agent = Agent::new(1, Coord::new(4, 4), genome, 4, 16);
        let agents = [agent.clone()];
        let world = default_world(&grid, &signals, &agents, &config);

        let values = compute_all(&agent, &world, &mut rng);
        assert_eq!(values.len(), NUM_SENSORS);
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
