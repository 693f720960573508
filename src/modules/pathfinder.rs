use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::modules::direction::Direction;
use crate::modules::grid::{Cell, Grid};

const SQRT2: f64 = std::f64::consts::SQRT_2;

/// Octile distance: exact remaining cost on an open 8-connected grid where
/// orthogonal steps cost 1 and diagonal steps cost sqrt(2). Admissible and
/// consistent, so the search below returns cost-optimal paths.
fn heuristic(from: Cell, to: Cell) -> f64 {
    let dx = (from.x - to.x).abs() as f64;
    let dy = (from.y - to.y).abs() as f64;
    (dx + dy) + (SQRT2 - 2.0) * dx.min(dy)
}

const fn step_cost(dir: Direction) -> f64 {
    if dir.is_diagonal() { SQRT2 } else { 1.0 }
}

/// Frontier entry ordered by lowest f first. Stale entries are left in the
/// heap and skipped on pop instead of being removed in place.
struct Open {
    f: f64,
    cell: Cell,
}

impl PartialEq for Open {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f
    }
}

impl Eq for Open {}

impl PartialOrd for Open {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Open {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap and we want the lowest f.
        other.f.total_cmp(&self.f)
    }
}

/// Full cost-optimal path from `start` to `target` as a list of step
/// directions. `None` when the frontier exhausts without reaching the target.
/// The target cell itself is always treated as enterable so units can walk
/// up to structures standing on it.
pub fn find_path(grid: &Grid, start: Cell, target: Cell) -> Option<Vec<Direction>> {
    if !grid.in_bounds(start) || !grid.in_bounds(target) {
        return None;
    }
    if start == target {
        return Some(Vec::new());
    }

    let mut open = BinaryHeap::new();
    let mut closed: HashSet<Cell> = HashSet::new();
    let mut best_g: HashMap<Cell, f64> = HashMap::new();
    let mut came_from: HashMap<Cell, (Cell, Direction)> = HashMap::new();

    best_g.insert(start, 0.0);
    open.push(Open {
        f: heuristic(start, target),
        cell: start,
    });

    while let Some(Open { cell, .. }) = open.pop() {
        if cell == target {
            return Some(reconstruct(&came_from, start, target));
        }
        if !closed.insert(cell) {
            continue; // stale heap entry
        }

        let g = best_g[&cell];
        for dir in Direction::ALL {
            let next = cell.offset(dir);
            if closed.contains(&next) {
                continue;
            }
            if next != target && !grid.is_passable(next) {
                continue;
            }

            let tentative = g + step_cost(dir);
            if best_g.get(&next).is_none_or(|&known| tentative < known) {
                best_g.insert(next, tentative);
                came_from.insert(next, (cell, dir));
                open.push(Open {
                    f: tentative + heuristic(next, target),
                    cell: next,
                });
            }
        }
    }

    None
}

/// First move of the cost-optimal path, which is all the coordinator needs;
/// recomputing per call keeps the result honest on a changing map.
pub fn next_step(grid: &Grid, start: Cell, target: Cell) -> Option<Direction> {
    find_path(grid, start, target)?.first().copied()
}

fn reconstruct(
    came_from: &HashMap<Cell, (Cell, Direction)>,
    start: Cell,
    target: Cell,
) -> Vec<Direction> {
    let mut steps = Vec::new();
    let mut cursor = target;
    while cursor != start {
        let (prev, dir) = came_from[&cursor];
        steps.push(dir);
        cursor = prev;
    }
    steps.reverse();
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from_rows(rows: &[&str]) -> Grid {
        let height = rows.len() as i32;
        let width = rows[0].len() as i32;
        let mut passable = vec![false; (width * height) as usize];
        // rows[0] is the top of the picture, i.e. the highest y.
        for (row_index, row) in rows.iter().enumerate() {
            let y = height - 1 - row_index as i32;
            for (x, ch) in row.chars().enumerate() {
                passable[(y * width + x as i32) as usize] = ch == '.';
            }
        }
        let cells = passable.len();
        Grid::new(width, height, passable, vec![0; cells])
    }

    fn path_cost(steps: &[Direction]) -> f64 {
        steps.iter().map(|d| step_cost(*d)).sum()
    }

    /// Uniform-cost brute force over the same move set, for cross-checking.
    fn brute_force_cost(grid: &Grid, start: Cell, target: Cell) -> Option<f64> {
        let mut best: HashMap<Cell, f64> = HashMap::new();
        best.insert(start, 0.0);
        let mut frontier = vec![start];
        while let Some(cell) = frontier.pop() {
            let g = best[&cell];
            for dir in Direction::ALL {
                let next = cell.offset(dir);
                if next != target && !grid.is_passable(next) {
                    continue;
                }
                if !grid.in_bounds(next) {
                    continue;
                }
                let cost = g + step_cost(dir);
                if best.get(&next).is_none_or(|&known| cost < known - 1e-9) {
                    best.insert(next, cost);
                    frontier.push(next);
                }
            }
        }
        best.get(&target).copied()
    }

    #[test]
    fn straight_line_uses_diagonals() {
        let grid = grid_from_rows(&["....", "....", "....", "...."]);
        let steps = find_path(&grid, Cell::new(0, 0), Cell::new(3, 3)).unwrap();
        assert_eq!(steps.len(), 3);
        assert!((path_cost(&steps) - 3.0 * SQRT2).abs() < 1e-9);
    }

    #[test]
    fn routes_around_walls_optimally() {
        let grid = grid_from_rows(&[
            ".....",
            ".###.",
            ".#...",
            ".#.#.",
            "...#.",
        ]);
        let start = Cell::new(0, 0);
        let target = Cell::new(4, 4);
        let steps = find_path(&grid, start, target).unwrap();

        // Walk the steps to make sure they are legal and land on the target.
        let mut at = start;
        for step in &steps {
            at = at.offset(*step);
            assert!(grid.is_passable(at), "stepped into a wall at {:?}", at);
        }
        assert_eq!(at, target);

        let expected = brute_force_cost(&grid, start, target).unwrap();
        assert!((path_cost(&steps) - expected).abs() < 1e-9);
    }

    #[test]
    fn optimal_cost_matches_brute_force_on_random_pairs() {
        let grid = grid_from_rows(&[
            "......",
            ".##...",
            "...#..",
            ".#.#..",
            ".#....",
            "......",
        ]);
        for (sx, sy, tx, ty) in [(0, 0, 5, 5), (0, 5, 5, 0), (2, 3, 5, 2), (1, 0, 0, 3)] {
            let start = Cell::new(sx, sy);
            let target = Cell::new(tx, ty);
            let steps = find_path(&grid, start, target).unwrap();
            let expected = brute_force_cost(&grid, start, target).unwrap();
            assert!(
                (path_cost(&steps) - expected).abs() < 1e-9,
                "suboptimal path {:?} -> {:?}",
                start,
                target
            );
        }
    }

    #[test]
    fn walled_off_target_reports_no_path() {
        let grid = grid_from_rows(&[
            "..#..",
            "..#..",
            "..#..",
            "..#..",
            "..#..",
        ]);
        assert_eq!(find_path(&grid, Cell::new(0, 2), Cell::new(4, 2)), None);
        assert_eq!(next_step(&grid, Cell::new(0, 2), Cell::new(4, 2)), None);
    }

    #[test]
    fn already_at_target_yields_no_step() {
        let grid = grid_from_rows(&["..", ".."]);
        assert_eq!(next_step(&grid, Cell::new(1, 1), Cell::new(1, 1)), None);
        assert_eq!(
            find_path(&grid, Cell::new(1, 1), Cell::new(1, 1)),
            Some(Vec::new())
        );
    }
}
