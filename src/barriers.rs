//! Barrier patterns: writes `0xFFFF` sentinels into the grid before any
//! agent is placed. Randomly-placed patterns consume the shared PRNG, so
//! barrier layout is part of the reproducible stream (section 4.10/9).

use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::grid::{Grid, BARRIER_CELL};
use crate::rng::Prng;

/// Which barrier pattern to stamp into the grid at generation start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarrierType {
    None,
    VerticalBarConstant,
    VerticalBarRandom,
    HorizontalBarConstant,
    HorizontalBarRandom,
    FiveBlocks,
    FloatingIslands,
    Spots,
}

fn fill_rect(grid: &mut Grid, cx: i32, cy: i32, half_w: i32, half_h: i32) {
    for y in (cy - half_h)..(cy + half_h) {
        for x in (cx - half_w)..(cx + half_w) {
            let c = Coord::new(x, y);
            if grid.is_in_bounds(c) {
                grid.set(c, BARRIER_CELL);
            }
        }
    }
}

fn fill_disk(grid: &mut Grid, center: Coord, radius: i32) {
    let r2 = (radius * radius) as i64;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if (dx * dx + dy * dy) as i64 > r2 {
                continue;
            }
            let c = Coord::new(center.x + dx, center.y + dy);
            if grid.is_in_bounds(c) {
                grid.set(c, BARRIER_CELL);
            }
        }
    }
}

/// Stamps `pattern` into `grid`. Must be called before any agent is placed.
/// Patterns with "Random" in the name draw from `rng`, which is why barrier
/// generation has a fixed position in the PRNG consumption order.
pub fn generate(grid: &mut Grid, pattern: BarrierType, rng: &mut Prng) {
    let size_x = grid.size_x();
    let size_y = grid.size_y();

    match pattern {
        BarrierType::None => {}

        BarrierType::VerticalBarConstant => {
            let x = size_x / 2;
            for y in (size_y / 4)..(size_y * 3 / 4) {
                grid.set(Coord::new(x, y), BARRIER_CELL);
            }
        }

        BarrierType::VerticalBarRandom => {
            let x = size_x / 4 + rng.next_int((size_x / 2).max(1) as u32) as i32;
            for y in (size_y / 4)..(size_y * 3 / 4) {
                let c = Coord::new(x, y);
                if grid.is_in_bounds(c) {
                    grid.set(c, BARRIER_CELL);
                }
            }
        }

        BarrierType::HorizontalBarConstant => {
            let y = size_y / 2;
            for x in (size_x / 4)..(size_x * 3 / 4) {
                grid.set(Coord::new(x, y), BARRIER_CELL);
            }
        }

        BarrierType::HorizontalBarRandom => {
            let y = size_y / 4 + rng.next_int((size_y / 2).max(1) as u32) as i32;
            for x in (size_x / 4)..(size_x * 3 / 4) {
                let c = Coord::new(x, y);
                if grid.is_in_bounds(c) {
                    grid.set(c, BARRIER_CELL);
                }
            }
        }

        BarrierType::FiveBlocks => {
            let half_w = (size_x / 50).max(1);
            let half_h = (size_y / 6).max(4);
            let centers = [
                (size_x as f64 * 0.25, size_y as f64 * 0.25),
                (size_x as f64 * 0.75, size_y as f64 * 0.25),
                (size_x as f64 * 0.25, size_y as f64 * 0.75),
                (size_x as f64 * 0.75, size_y as f64 * 0.75),
                (size_x as f64 * 0.5, size_y as f64 * 0.5),
            ];
            for (cx, cy) in centers {
                fill_rect(grid, cx.floor() as i32, cy.floor() as i32, half_w, half_h);
            }
        }

        BarrierType::FloatingIslands => {
            let radius = ((size_x.min(size_y)) / 12).max(2);
            let margin_x = (size_x as f64 * 0.15) as i32;
            let margin_y = (size_y as f64 * 0.15) as i32;
            let span_x = (size_x - 2 * margin_x).max(1);
            let span_y = (size_y - 2 * margin_y).max(1);
            for _ in 0..5 {
                let cx = margin_x + rng.next_int(span_x as u32) as i32;
                let cy = margin_y + rng.next_int(span_y as u32) as i32;
                fill_disk(grid, Coord::new(cx, cy), radius);
            }
        }

        BarrierType::Spots => {
            let spacing = (size_x.min(size_y) / 4).max(1);
            let radius = (size_x.min(size_y) / 20).max(1);
            let mut y = spacing / 2;
            while y < size_y {
                let mut x = spacing / 2;
                while x < size_x {
                    fill_disk(grid, Coord::new(x, y), radius);
                    x += spacing;
                }
                y += spacing;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_a_no_op() {
        let mut grid = Grid::new(16, 16);
        let mut rng = Prng::new(1);
        generate(&mut grid, BarrierType::None, &mut rng);
        for x in 0..16 {
            for y in 0..16 {
                assert!(!grid.is_barrier(Coord::new(x, y)));
            }
        }
    }

    #[test]
    fn vertical_bar_constant_is_centered() {
        let mut grid = Grid::new(20, 20);
        let mut rng = Prng::new(1);
        generate(&mut grid, BarrierType::VerticalBarConstant, &mut rng);
        assert!(grid.is_barrier(Coord::new(10, 10)));
        assert!(!grid.is_barrier(Coord::new(0, 10)));
    }

    #[test]
    fn random_barrier_consumes_rng_and_stays_reproducible() {
        let mut grid_a = Grid::new(20, 20);
        let mut rng_a = Prng::new(42);
        generate(&mut grid_a, BarrierType::VerticalBarRandom, &mut rng_a);

        let mut grid_b = Grid::new(20, 20);
        let mut rng_b = Prng::new(42);
        generate(&mut grid_b, BarrierType::VerticalBarRandom, &mut rng_b);

        assert_eq!(grid_a, grid_b);
    }

    #[test]
    fn five_blocks_places_five_disjoint_rectangles() {
        let mut grid = Grid::new(100, 60);
        let mut rng = Prng::new(1);
        generate(&mut grid, BarrierType::FiveBlocks, &mut rng);
        assert!(grid.is_barrier(Coord::new(50, 30)));
        assert!(grid.is_barrier(Coord::new(25, 15)));
    }
}
