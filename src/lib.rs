pub mod modules;

pub use modules::deposits::{DepositMap, density_at};
pub use modules::direction::Direction;
pub use modules::game::{GameWorld, Spot, Team, UnitId, UnitKind};
pub use modules::grid::{Cell, Grid};
pub use modules::navigator::{DirectionField, FieldCache, Navigator, Symmetry};
pub use modules::pathfinder::{find_path, next_step};
pub use modules::pods::{Coordinator, Order, Pod, build_pods, nearest_ore, POD_RANGE_SQ};
pub use modules::sim::{
    Event, SimWorld, generate_map, BUILD_WORK, FOUND_COST, HARVEST_AMOUNT, PRODUCE_COST,
    PRODUCE_TIME, SENSE_RANGE_SQ, STARTING_ORE,
};
pub use modules::snapshot::{
    PodSnapshot, UnitSnapshot, WorldSnapshot, capture, load_latest_snapshot_from_dir,
    load_snapshot, save_snapshot, save_snapshot_step, snapshot_file_path, snapshots_dir,
};
