use crate::modules::grid::{Cell, Grid};

/// Sum of believed ore over the passable cells of a square window of
/// half-width `radius` around `(x, y)`, clipped to the map. Impassable and
/// out-of-bounds cells are excluded outright rather than counted as zero.
pub fn density_at(grid: &Grid, x: i32, y: i32, radius: i32) -> u32 {
    let mut total = 0u32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let cell = Cell::new(x + dx, y + dy);
            if !grid.in_bounds(cell) || !grid.is_passable(cell) {
                continue;
            }
            total = total.saturating_add(grid.belief_at(cell));
        }
    }
    total
}

/// Per-cell ore density, computed once at startup and used to seed mining
/// target discovery. Impassable cells keep a density of zero.
#[derive(Clone, Debug)]
pub struct DepositMap {
    width: i32,
    values: Vec<u32>,
}

impl DepositMap {
    pub fn build(grid: &Grid, radius: i32) -> Self {
        let mut values = vec![0u32; (grid.width() * grid.height()) as usize];
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let cell = Cell::new(x, y);
                if !grid.is_passable(cell) {
                    continue;
                }
                values[(y * grid.width() + x) as usize] = density_at(grid, x, y, radius);
            }
        }
        Self {
            width: grid.width(),
            values,
        }
    }

    pub fn value_at(&self, cell: Cell) -> u32 {
        // Per-axis check: a raw row-major index would alias a negative or
        // too-large x onto a neighbouring row.
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width {
            return 0;
        }
        let index = (cell.y * self.width + cell.x) as usize;
        self.values.get(index).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_sums_a_window() {
        let mut ore = vec![0u32; 121];
        // 3x3 block around (5,5) summing to 40.
        let block = [
            (4, 4, 5),
            (5, 4, 5),
            (6, 4, 5),
            (4, 5, 5),
            (5, 5, 4),
            (6, 5, 4),
            (4, 6, 4),
            (5, 6, 4),
            (6, 6, 4),
        ];
        for (x, y, v) in block {
            ore[(y * 11 + x) as usize] = v;
        }
        let grid = Grid::new(11, 11, vec![true; 121], ore);

        assert_eq!(density_at(&grid, 5, 5, 1), 40);
        assert_eq!(density_at(&grid, 0, 0, 1), 0);
    }

    #[test]
    fn density_skips_impassable_cells() {
        let mut passable = vec![true; 9];
        passable[4] = false; // (1,1)
        let ore = vec![3u32; 9];
        let grid = Grid::new(3, 3, passable, ore);

        // 9 cells in the window minus the impassable centre.
        assert_eq!(density_at(&grid, 1, 1, 1), 24);
    }

    #[test]
    fn density_clips_to_map_bounds() {
        let grid = Grid::new(2, 2, vec![true; 4], vec![1; 4]);
        assert_eq!(density_at(&grid, 0, 0, 1), 4);
    }

    #[test]
    fn value_at_is_zero_off_the_map() {
        let grid = Grid::new(3, 3, vec![true; 9], vec![5; 9]);
        let deposits = DepositMap::build(&grid, 1);

        // A negative x must not wrap onto the end of the previous row.
        assert_eq!(deposits.value_at(Cell::new(-1, 1)), 0);
        assert_eq!(deposits.value_at(Cell::new(3, 0)), 0);
        assert_eq!(deposits.value_at(Cell::new(0, 3)), 0);
        assert_eq!(deposits.value_at(Cell::new(0, -1)), 0);
    }

    #[test]
    fn deposit_map_matches_point_queries() {
        let ore = vec![2u32; 16];
        let grid = Grid::new(4, 4, vec![true; 16], ore);
        let deposits = DepositMap::build(&grid, 1);

        assert_eq!(deposits.value_at(Cell::new(1, 1)), density_at(&grid, 1, 1, 1));
        assert_eq!(deposits.value_at(Cell::new(0, 0)), density_at(&grid, 0, 0, 1));
    }
}
