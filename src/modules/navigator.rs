use std::collections::{HashMap, VecDeque};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::modules::direction::Direction;
use crate::modules::grid::{Cell, Grid};
use crate::modules::pathfinder;

/// How the two hemispheres of the map mirror each other. One flood fill per
/// representative target is enough to fill in the mirrored field for free.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Symmetry {
    /// Hemispheres are reflections with y flipped.
    Vertical,
    /// Hemispheres are reflections with x flipped.
    Horizontal,
    /// Hemispheres are 180-degree rotations of each other.
    Rotated,
}

impl Symmetry {
    pub const fn mirror_cell(self, cell: Cell, width: i32, height: i32) -> Cell {
        match self {
            Symmetry::Vertical => Cell::new(cell.x, height - 1 - cell.y),
            Symmetry::Horizontal => Cell::new(width - 1 - cell.x, cell.y),
            Symmetry::Rotated => Cell::new(width - 1 - cell.x, height - 1 - cell.y),
        }
    }

    pub const fn mirror_direction(self, dir: Direction) -> Direction {
        match self {
            Symmetry::Vertical => dir.mirror_vertical(),
            Symmetry::Horizontal => dir.mirror_horizontal(),
            Symmetry::Rotated => dir.opposite(),
        }
    }
}

/// Dense per-target field: for every cell, the next step toward the target.
/// `None` marks the target itself and cells the target cannot be reached from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectionField {
    width: i32,
    entries: Vec<Option<Direction>>,
}

impl DirectionField {
    fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            entries: vec![None; (width * height) as usize],
        }
    }

    pub fn get(&self, cell: Cell) -> Option<Direction> {
        let index = (cell.y * self.width + cell.x) as usize;
        self.entries.get(index).copied().flatten()
    }

    fn set(&mut self, cell: Cell, dir: Direction) {
        let index = (cell.y * self.width + cell.x) as usize;
        if let Some(slot) = self.entries.get_mut(index) {
            *slot = Some(dir);
        }
    }
}

/// Precomputed direction fields keyed by target cell. Each reverse flood fill
/// from a representative target also writes the field for the symmetric
/// target, so only one hemisphere's worth of BFS runs is ever paid for.
#[derive(Clone, Debug, Default)]
pub struct FieldCache {
    fields: HashMap<Cell, DirectionField>,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, target: Cell) -> bool {
        self.fields.contains_key(&target)
    }

    /// O(1) lookup. `None` either means the target was never precomputed
    /// (check `contains` to tell) or `from` cannot reach it.
    pub fn direction_from(&self, target: Cell, from: Cell) -> Option<Direction> {
        self.fields.get(&target).and_then(|field| field.get(from))
    }

    /// Reverse BFS flood fill from `target` over the 8-connected passable
    /// graph. A cell discovered by stepping `d` away from the frontier gets
    /// `d.opposite()` recorded: the way back toward the target. The mirrored
    /// field for the symmetric target is written in the same pass.
    ///
    /// Steps are unweighted here; diagonal and orthogonal count the same.
    /// The online pathfinder is the one that prices diagonals properly.
    pub fn precompute_pair(&mut self, grid: &Grid, target: Cell, symmetry: Symmetry) {
        let (width, height) = (grid.width(), grid.height());
        let mut field = DirectionField::new(width, height);
        let mut sym_field = DirectionField::new(width, height);

        let mut open = VecDeque::new();
        open.push_back(target);
        while let Some(next) = open.pop_front() {
            for d in Direction::ALL {
                let adj = next.offset(d);
                if !grid.in_bounds(adj) || !grid.is_passable(adj) {
                    continue;
                }
                // Enqueue-once guard: a cell with a recorded direction is done.
                if adj == target || field.get(adj).is_some() {
                    continue;
                }
                open.push_back(adj);

                let nav_dir = d.opposite();
                field.set(adj, nav_dir);
                sym_field.set(
                    symmetry.mirror_cell(adj, width, height),
                    symmetry.mirror_direction(nav_dir),
                );
            }
        }

        let sym_target = symmetry.mirror_cell(target, width, height);
        self.fields.insert(target, field);
        self.fields.insert(sym_target, sym_field);
    }

    /// Precompute one representative per symmetric pair of passable cells:
    /// the lower hemisphere for y-flipping symmetries, the left one for
    /// x-flipping symmetry.
    pub fn precompute_half(&mut self, grid: &Grid, symmetry: Symmetry) {
        let (width, height) = (grid.width(), grid.height());
        let (x_limit, y_limit) = match symmetry {
            Symmetry::Horizontal => ((width + 1) / 2, height),
            Symmetry::Vertical | Symmetry::Rotated => (width, (height + 1) / 2),
        };

        for y in 0..y_limit {
            for x in 0..x_limit {
                let target = Cell::new(x, y);
                if !grid.is_passable(target) || self.contains(target) {
                    continue;
                }
                self.precompute_pair(grid, target, symmetry);
            }
        }
    }
}

/// Movement oracle: precomputed fields first, online A* when the target was
/// never precomputed. `None` means "no step available, stay put".
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    cache: FieldCache,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: FieldCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &FieldCache {
        &self.cache
    }

    pub fn precompute(&mut self, grid: &Grid, symmetry: Symmetry) {
        self.cache.precompute_half(grid, symmetry);
    }

    pub fn step_toward(&self, grid: &Grid, from: Cell, target: Cell) -> Option<Direction> {
        if from == target {
            return None;
        }
        if self.cache.contains(target) {
            return self.cache.direction_from(target, from);
        }
        pathfinder::next_step(grid, from, target)
    }
}
