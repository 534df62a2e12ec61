//! Survival criteria: spatial/relational predicates evaluated against the
//! grid at generation end. A non-empty set of active criteria is OR'd
//! together; an empty set means every living agent survives.

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::coord::Coord;
use crate::grid::Grid;

/// One survival predicate, per section 4.11.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurvivalCriterion {
    Circle,
    RightEighth,
    LeftEighth,
    CenterWeighted,
    CornerWeighted,
    Pairs,
    Contact,
    AgainstAnyWall,
    TouchAnyWall,
}

impl SurvivalCriterion {
    /// Evaluates this criterion for `agent` against `grid`.
    pub fn evaluate(self, agent: &Agent, grid: &Grid) -> bool {
        let size_x = grid.size_x();
        let size_y = grid.size_y();
        let loc = agent.loc;

        match self {
            SurvivalCriterion::Circle => {
                let center = Coord::new(size_x / 2, size_y / 2);
                let radius = (size_x.min(size_y) as f64) / 4.0;
                loc.dist(center) <= radius
            }

            SurvivalCriterion::RightEighth => (loc.x as f64) > (size_x as f64) * 7.0 / 8.0,

            SurvivalCriterion::LeftEighth => (loc.x as f64) < (size_x as f64) / 8.0,

            SurvivalCriterion::CenterWeighted => {
                let center = Coord::new(size_x / 2, size_y / 2);
                let max_diag =
                    (((size_x as f64) / 2.0).powi(2) + ((size_y as f64) / 2.0).powi(2)).sqrt();
                if max_diag == 0.0 {
                    return true;
                }
                1.0 - loc.dist(center) / max_diag > 0.5
            }

            SurvivalCriterion::CornerWeighted => {
                let corners = [
                    Coord::new(0, 0),
                    Coord::new(size_x - 1, 0),
                    Coord::new(0, size_y - 1),
                    Coord::new(size_x - 1, size_y - 1),
                ];
                let nearest = corners
                    .iter()
                    .map(|c| loc.dist(*c))
                    .fold(f64::INFINITY, f64::min);
                let threshold =
                    0.25 * ((size_x as f64).powi(2) + (size_y as f64).powi(2)).sqrt() / 2.0;
                nearest < threshold
            }

            SurvivalCriterion::Pairs => {
                let mut found = false;
                grid.visit_neighborhood(loc, 1.5, |c| {
                    if c != loc && grid.is_occupied(c) {
                        found = true;
                    }
                });
                found
            }

            SurvivalCriterion::Contact => {
                let neighbors = [
                    Coord::new(loc.x, loc.y - 1),
                    Coord::new(loc.x, loc.y + 1),
                    Coord::new(loc.x - 1, loc.y),
                    Coord::new(loc.x + 1, loc.y),
                ];
                neighbors.iter().any(|c| grid.is_occupied(*c))
            }

            SurvivalCriterion::AgainstAnyWall => {
                loc.x == 0 || loc.y == 0 || loc.x == size_x - 1 || loc.y == size_y - 1
            }

            SurvivalCriterion::TouchAnyWall => {
                loc.x <= 1 || loc.y <= 1 || loc.x >= size_x - 2 || loc.y >= size_y - 2
            }
        }
    }
}

/// Returns the set of agent indices (1-based) satisfying any active
/// criterion. An empty `criteria` slice means every living agent survives.
pub fn evaluate_survivors(
    agents: &[Agent],
    grid: &Grid,
    criteria: &[SurvivalCriterion],
) -> Vec<usize> {
    agents
        .iter()
        .filter(|a| a.alive)
        .filter(|a| criteria.is_empty() || criteria.iter().any(|c| c.evaluate(a, grid)))
        .map(|a| a.index)
        .collect()
}
