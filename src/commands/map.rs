use gridmind::{Cell, DepositMap, Grid, Symmetry, generate_map};

pub(super) fn run_map(
    width: i32,
    height: i32,
    seed: Option<u64>,
    symmetry: Symmetry,
) -> Result<(), String> {
    if width < 4 || height < 4 {
        return Err("map must be at least 4x4".into());
    }

    let seed = seed.unwrap_or_else(rand::random);
    let (passable, ore) = generate_map(width, height, seed, symmetry);
    let grid = Grid::new(width, height, passable, ore);

    println!("map {}x{} seed={} symmetry={:?}", width, height, seed, symmetry);

    let mut total: u64 = 0;
    for y in (0..height).rev() {
        let mut row = String::with_capacity(width as usize);
        for x in 0..width {
            let cell = Cell::new(x, y);
            row.push(glyph(&grid, cell));
            total += grid.belief_at(cell) as u64;
        }
        println!("{}", row);
    }
    println!("total ore: {}", total);

    let deposits = DepositMap::build(&grid, 1);
    let mut richest: Option<(Cell, u32)> = None;
    for y in 0..height {
        for x in 0..width {
            let cell = Cell::new(x, y);
            let value = deposits.value_at(cell);
            if richest.is_none_or(|(_, top)| value > top) {
                richest = Some((cell, value));
            }
        }
    }
    if let Some((cell, value)) = richest {
        println!("richest spot: ({}, {}) with {} ore in reach", cell.x, cell.y, value);
    }
    Ok(())
}

fn glyph(grid: &Grid, cell: Cell) -> char {
    if !grid.is_passable(cell) {
        return '#';
    }
    match grid.belief_at(cell) {
        0 => '.',
        quantity => {
            // Single digit per cell; anything past 9 tens reads as '9'.
            let tens = (quantity / 10).min(9);
            char::from(b'0' + tens as u8)
        }
    }
}
