//! Owns the live agent array and the move/death intent queues produced
//! during one step, draining them atomically at step-end in the fixed
//! order: deaths first, then moves (section 4.9).

use crate::actions::QueuedEffects;
use crate::agent::Agent;
use crate::coord::Coord;
use crate::grid::Grid;

/// The agents of one generation plus the queues that accumulate move/death
/// intents during a step. Queues are only ever non-empty between the start
/// and the drain of a single `stepOnce`.
#[derive(Default)]
pub struct Population {
    pub agents: Vec<Agent>,
    move_queue: Vec<(usize, Coord)>,
    death_queue: Vec<usize>,
}

impl Population {
    /// Replaces the live agents with a fresh set (called at generation
    /// start); clears any stale queue contents.
    pub fn set_agents(&mut self, agents: Vec<Agent>) {
        self.agents = agents;
        self.move_queue.clear();
        self.death_queue.clear();
    }

    /// Agent by 1-based index. Panics on out-of-range index; callers never
    /// pass index 0 (reserved) or an index beyond the live population.
    pub fn agent(&self, index: usize) -> &Agent {
        &self.agents[index - 1]
    }

    /// Mutable agent by 1-based index.
    pub fn agent_mut(&mut self, index: usize) -> &mut Agent {
        &mut self.agents[index - 1]
    }

    /// Merges one agent's queued move/kill effects into the shared queues.
    pub fn enqueue(&mut self, effects: QueuedEffects) {
        self.move_queue.extend(effects.moves);
        self.death_queue.extend(effects.deaths);
    }

    /// Drains deaths then moves against `grid`, per the fixed step-end
    /// order. A move whose source agent died this step, or whose
    /// destination is no longer empty, is silently dropped — it was always
    /// speculative (section 9 design notes).
    ///
    /// Returns the number of deaths actually applied (for `killDeaths`
    /// statistics).
    pub fn drain_queues(&mut self, grid: &mut Grid) -> u32 {
        let mut kill_deaths = 0;

        for index in self.death_queue.drain(..) {
            let agent = &mut self.agents[index - 1];
            if !agent.alive {
                continue;
            }
            agent.alive = false;
            grid.set(agent.loc, crate::grid::EMPTY_CELL);
            kill_deaths += 1;
        }

        for (index, dest) in self.move_queue.drain(..) {
            let alive = self.agents[index - 1].alive;
            if !alive || !grid.is_empty(dest) {
                continue;
            }
            let src = self.agents[index - 1].loc;
            grid.set(src, crate::grid::EMPTY_CELL);
            grid.set(dest, index as u16);
            self.agents[index - 1].loc = dest;
        }

        kill_deaths
    }

    /// Living agents, in index order.
    pub fn living(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.alive)
    }
}
