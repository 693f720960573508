use serde::{Deserialize, Serialize};

use crate::modules::direction::Direction;

/// A map coordinate. Unlike grid indices these are signed so that stepping
/// off the edge is representable and can be rejected by `Grid::in_bounds`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn distance_squared(self, other: Cell) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Coarse compass direction toward `other`; `Center` for the same cell.
    pub fn direction_to(self, other: Cell) -> Direction {
        match ((other.x - self.x).signum(), (other.y - self.y).signum()) {
            (0, 1) => Direction::North,
            (1, 1) => Direction::Northeast,
            (1, 0) => Direction::East,
            (1, -1) => Direction::Southeast,
            (0, -1) => Direction::South,
            (-1, -1) => Direction::Southwest,
            (-1, 0) => Direction::West,
            (-1, 1) => Direction::Northwest,
            _ => Direction::Center,
        }
    }
}

/// Static passability plus the agent's running belief about how much ore each
/// cell holds. Passability never changes for the life of a game; belief is
/// written through from sensing every step.
#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    passable: Vec<bool>,
    belief: Vec<u32>,
}

impl Grid {
    pub fn new(width: i32, height: i32, passable: Vec<bool>, ore: Vec<u32>) -> Self {
        let cells = (width as usize) * (height as usize);
        assert_eq!(passable.len(), cells, "passability table size mismatch");
        assert_eq!(ore.len(), cells, "ore table size mismatch");
        Self {
            width,
            height,
            passable,
            belief: ore,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        Some((cell.y * self.width + cell.x) as usize)
    }

    /// Whether a unit may ever occupy this cell. Out-of-bounds reads are
    /// `false` here; callers that care about the distinction check
    /// `in_bounds` first.
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.index(cell).map(|i| self.passable[i]).unwrap_or(false)
    }

    pub fn belief_at(&self, cell: Cell) -> u32 {
        self.index(cell).map(|i| self.belief[i]).unwrap_or(0)
    }

    pub fn set_belief(&mut self, cell: Cell, quantity: u32) {
        if let Some(i) = self.index(cell) {
            self.belief[i] = quantity;
        }
    }

    /// Fold a fresh observation into belief. Belief only ever moves down
    /// between corrections so depletion by others is never overestimated.
    pub fn observe(&mut self, cell: Cell, seen: u32) {
        if let Some(i) = self.index(cell) {
            self.belief[i] = self.belief[i].min(seen);
        }
    }

    /// Overwrite belief with a ground-truth reading, e.g. right after one of
    /// our own units harvested the cell.
    pub fn correct(&mut self, cell: Cell, seen: u32) {
        self.set_belief(cell, seen);
    }

    /// Sweep the whole map and fold in an observation for every currently
    /// sensable cell.
    pub fn refresh<F, G>(&mut self, mut can_sense: F, mut observed_at: G)
    where
        F: FnMut(Cell) -> bool,
        G: FnMut(Cell) -> u32,
    {
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = Cell::new(x, y);
                if can_sense(cell) {
                    let seen = observed_at(cell);
                    self.observe(cell, seen);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: i32, height: i32) -> Grid {
        let cells = (width * height) as usize;
        Grid::new(width, height, vec![true; cells], vec![0; cells])
    }

    #[test]
    fn out_of_bounds_is_not_passable() {
        let grid = open_grid(4, 4);
        assert!(!grid.in_bounds(Cell::new(-1, 0)));
        assert!(!grid.in_bounds(Cell::new(0, 4)));
        assert!(!grid.is_passable(Cell::new(4, 0)));
        assert!(grid.is_passable(Cell::new(3, 3)));
    }

    #[test]
    fn observe_never_raises_belief() {
        let mut grid = open_grid(3, 3);
        let cell = Cell::new(1, 1);
        grid.set_belief(cell, 10);

        grid.observe(cell, 25);
        assert_eq!(grid.belief_at(cell), 10);

        grid.observe(cell, 4);
        assert_eq!(grid.belief_at(cell), 4);
    }

    #[test]
    fn correct_can_raise_belief_back_to_truth() {
        let mut grid = open_grid(3, 3);
        let cell = Cell::new(2, 0);
        grid.set_belief(cell, 0);

        grid.correct(cell, 7);
        assert_eq!(grid.belief_at(cell), 7);
    }

    #[test]
    fn refresh_only_touches_sensable_cells() {
        let mut grid = open_grid(2, 2);
        grid.set_belief(Cell::new(0, 0), 9);
        grid.set_belief(Cell::new(1, 1), 9);

        grid.refresh(|c| c == Cell::new(0, 0), |_| 2);

        assert_eq!(grid.belief_at(Cell::new(0, 0)), 2);
        assert_eq!(grid.belief_at(Cell::new(1, 1)), 9);
    }

    #[test]
    fn direction_to_points_at_neighbours() {
        let origin = Cell::new(5, 5);
        assert_eq!(origin.direction_to(Cell::new(5, 9)), Direction::North);
        assert_eq!(origin.direction_to(Cell::new(9, 1)), Direction::Southeast);
        assert_eq!(origin.direction_to(origin), Direction::Center);
    }
}
