use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::modules::direction::Direction;
use crate::modules::grid::Cell;

pub type UnitId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub const fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Team::Red => "red",
            Team::Blue => "blue",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Worker,
    Factory,
}

/// Where a unit is. Garrisoned units are inside a structure and have no map
/// coordinate; the two cases are never conflated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spot {
    OnMap(Cell),
    Garrisoned(UnitId),
}

impl Spot {
    pub const fn on_map(self) -> Option<Cell> {
        match self {
            Spot::OnMap(cell) => Some(cell),
            Spot::Garrisoned(_) => None,
        }
    }

    pub const fn is_garrisoned(self) -> bool {
        matches!(self, Spot::Garrisoned(_))
    }
}

/// Everything the decision core consumes from the surrounding game session.
///
/// Every mutating `do_*` has a `can_*` twin; callers check legality first and
/// treat "not legal" as "skip this step", never as an error. `advance`
/// commits the step and is called exactly once per control-loop iteration.
pub trait GameWorld {
    fn unit_exists(&self, id: UnitId) -> bool;
    fn spot_of(&self, id: UnitId) -> Option<Spot>;
    fn team_of(&self, id: UnitId) -> Option<Team>;
    fn kind_of(&self, id: UnitId) -> Option<UnitKind>;
    fn units_of(&self, team: Team) -> Vec<UnitId>;
    /// On-map units of `team` within squared distance `dist_sq` of `cell`.
    fn units_near(&self, cell: Cell, dist_sq: i64, team: Team) -> Vec<UnitId>;

    /// Whether `team` currently has sensor coverage of `cell`.
    fn can_sense(&self, team: Team, cell: Cell) -> bool;
    /// Ground-truth ore at `cell`. Only meaningful where `can_sense` holds.
    fn ore_at(&self, cell: Cell) -> u32;

    fn is_built(&self, id: UnitId) -> bool;
    fn is_producing(&self, id: UnitId) -> bool;

    fn can_move(&self, id: UnitId, dir: Direction) -> bool;
    fn do_move(&mut self, id: UnitId, dir: Direction);

    fn can_build(&self, worker: UnitId, target: UnitId) -> bool;
    fn do_build(&mut self, worker: UnitId, target: UnitId);

    fn can_found(&self, worker: UnitId, dir: Direction) -> bool;
    /// Founds a new structure adjacent to `worker`; returns its id.
    fn do_found(&mut self, worker: UnitId, dir: Direction) -> Option<UnitId>;

    fn can_harvest(&self, worker: UnitId, dir: Direction) -> bool;
    fn do_harvest(&mut self, worker: UnitId, dir: Direction);

    fn can_produce(&self, factory: UnitId) -> bool;
    fn do_produce(&mut self, factory: UnitId);

    fn can_release(&self, factory: UnitId, dir: Direction) -> bool;
    fn do_release(&mut self, factory: UnitId, dir: Direction);

    fn advance(&mut self);
}
