//! The 17 actions: given an agent's action levels (tanh outputs in
//! `[-1, 1]`), queue the effects they have on the world.
//!
//! Movement is deferred (appended to a move queue the caller drains at
//! step-end); signal emission is immediate (signals are additive, so order
//! only affects magnitude, never correctness); `oscPeriod`/`longProbeDist`/
//! `responsiveness` changes apply immediately to the acting agent only.

use crate::agent::Agent;
use crate::config::SimParams;
use crate::coord::{Coord, Direction};
use crate::grid::Grid;
use crate::rng::Prng;
use crate::signals::Signals;

/// The fixed action index order. Matches the table order in the spec (see
/// `DESIGN.md`).
pub const NUM_ACTIONS: usize = 17;

/// The signal layer `EmitSignal0` deposits into.
const SIGNAL0_LAYER: usize = 0;

/// One of the 17 actions, in their fixed index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Action {
    MoveX = 0,
    MoveY,
    MoveForward,
    MoveRl,
    MoveRandom,
    MoveLeft,
    MoveRight,
    MoveReverse,
    MoveEast,
    MoveWest,
    MoveNorth,
    MoveSouth,
    SetOscillatorPeriod,
    SetLongprobeDist,
    SetResponsiveness,
    EmitSignal0,
    KillForward,
}

/// All actions, in index order. Kept in sync with `NUM_ACTIONS`.
pub const ALL: [Action; NUM_ACTIONS] = [
    Action::MoveX,
    Action::MoveY,
    Action::MoveForward,
    Action::MoveRl,
    Action::MoveRandom,
    Action::MoveLeft,
    Action::MoveRight,
    Action::MoveReverse,
    Action::MoveEast,
    Action::MoveWest,
    Action::MoveNorth,
    Action::MoveSouth,
    Action::SetOscillatorPeriod,
    Action::SetLongprobeDist,
    Action::SetResponsiveness,
    Action::EmitSignal0,
    Action::KillForward,
];

/// Read-only world state an action needs to decide whether an effect fires.
pub struct World<'a> {
    pub grid: &'a Grid,
    pub agents: &'a [Agent],
    pub config: &'a SimParams,
}

/// Effects queued during one agent's action execution, drained by the
/// population manager at step-end in the fixed order (deaths, then moves).
#[derive(Default)]
pub struct QueuedEffects {
    pub moves: Vec<(usize, Coord)>,
    pub deaths: Vec<usize>,
}

/// Sigmoid mapping raw `responsiveness` to the firing-threshold gate. The
/// `0.5` and `8` multipliers are source-embedded magic numbers preserved
/// verbatim (see `SPEC_FULL.md` Open Questions); do not "clean them up".
fn responsiveness_effective(responsiveness: f32, k: f64) -> f32 {
    let raw = responsiveness as f64;
    (1.0 / (1.0 + (-(k * (raw - 0.5) * 8.0)).exp())) as f32
}

fn fires(level: f32, threshold: f32) -> bool {
    level.abs() > threshold * 0.5
}

/// Executes every action level for one agent's turn: mutates `agent`'s own
/// state immediately (oscillator period, long-probe distance,
/// responsiveness, heading), deposits signal emissions immediately into
/// `signals`, and appends any move/kill intents to `effects`.
pub fn apply_actions(
    agent: &mut Agent,
    levels: &[f32],
    world: &World,
    signals: &mut Signals,
    rng: &mut Prng,
    effects: &mut QueuedEffects,
) {
    debug_assert_eq!(levels.len(), NUM_ACTIONS);

    let threshold = responsiveness_effective(agent.responsiveness, world.config.responsiveness_curve_k_factor);
    let fwd_dir = agent.last_move_dir;
    let fwd = fwd_dir.as_unit_coord();

    let mut move_x = 0.0f32;
    let mut move_y = 0.0f32;

    let level = |a: Action| levels[a as usize];

    move_x += level(Action::MoveX);
    move_y += level(Action::MoveY);

    let l = level(Action::MoveForward);
    if fires(l, threshold) {
        move_x += fwd.x as f32 * l;
        move_y += fwd.y as f32 * l;
    }

    let l = level(Action::MoveRl);
    if fires(l, threshold) {
        let dir = if l > 0.0 { fwd_dir.rotate_90_cw() } else { fwd_dir.rotate_90_ccw() };
        let c = dir.as_unit_coord();
        move_x += c.x as f32;
        move_y += c.y as f32;
    }

    let l = level(Action::MoveRandom);
    if fires(l, threshold) {
        let ring_idx = rng.next_int(8) as usize;
        const RING: [Direction; 8] = [
            Direction::North,
            Direction::NorthEast,
            Direction::East,
            Direction::SouthEast,
            Direction::South,
            Direction::SouthWest,
            Direction::West,
            Direction::NorthWest,
        ];
        let c = RING[ring_idx].as_unit_coord();
        move_x += c.x as f32;
        move_y += c.y as f32;
    }

    let l = level(Action::MoveLeft);
    if fires(l, threshold) {
        let c = fwd_dir.rotate_90_ccw().as_unit_coord();
        move_x += c.x as f32;
        move_y += c.y as f32;
    }

    let l = level(Action::MoveRight);
    if fires(l, threshold) {
        let c = fwd_dir.rotate_90_cw().as_unit_coord();
        move_x += c.x as f32;
        move_y += c.y as f32;
    }

    let l = level(Action::MoveReverse);
    if fires(l, threshold) {
        let c = fwd_dir.rotate_180().as_unit_coord();
        move_x += c.x as f32;
        move_y += c.y as f32;
    }

    let l = level(Action::MoveEast);
    if fires(l, threshold) {
        move_x += 1.0;
    }
    let l = level(Action::MoveWest);
    if fires(l, threshold) {
        move_x -= 1.0;
    }
    let l = level(Action::MoveNorth);
    if fires(l, threshold) {
        move_y -= 1.0;
    }
    let l = level(Action::MoveSouth);
    if fires(l, threshold) {
        move_y += 1.0;
    }

    // SET_* actions fire unconditionally.
    let l = level(Action::SetOscillatorPeriod);
    agent.osc_period = (1 + (l.abs() * 100.0).floor() as i64).max(2) as u32;

    let l = level(Action::SetLongprobeDist);
    agent.long_probe_dist =
        (1 + (l.abs() as f64 * world.config.long_probe_distance as f64).floor() as i64).max(1) as u32;

    let l = level(Action::SetResponsiveness);
    agent.responsiveness = ((l + 1.0) / 2.0).clamp(0.0, 1.0);

    let l = level(Action::EmitSignal0);
    if fires(l, threshold) {
        signals.emit(SIGNAL0_LAYER, agent.loc, 1.5, world.grid);
    }

    let l = level(Action::KillForward);
    if world.config.kill_enable && fires(l, threshold) {
        let target = agent.loc.add(fwd);
        if world.grid.is_in_bounds(target) && world.grid.is_occupied(target) {
            let cell = world.grid.at(target);
            if cell != crate::grid::BARRIER_CELL {
                let victim = &world.agents[(cell - 1) as usize];
                if victim.alive {
                    effects.deaths.push(victim.index);
                }
            }
        }
    }

    let dx = if move_x.abs() > 0.5 { move_x.signum() as i32 } else { 0 };
    let dy = if move_y.abs() > 0.5 { move_y.signum() as i32 } else { 0 };

    if (dx, dy) != (0, 0) {
        let target = Coord::new(agent.loc.x + dx, agent.loc.y + dy);
        if world.grid.is_in_bounds(target) && world.grid.is_empty(target) {
            effects.moves.push((agent.index, target));
            if let Some(new_dir) = Direction::from_unit_coord(dx, dy) {
                agent.last_move_dir = new_dir;
            }
        }
    }
}
