use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::modules::game::{GameWorld, Spot, Team, UnitKind};
use crate::modules::grid::Cell;
use crate::modules::pods::{Coordinator, Order};
use crate::modules::sim::SimWorld;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: u32,
    pub team: Team,
    pub kind: UnitKind,
    pub spot: Spot,
    pub built: bool,
    pub producing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodSnapshot {
    pub members: Vec<u32>,
    pub order: Order,
    pub build_target: Option<u32>,
    pub mine_target: Option<Cell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub step: u64,
    pub width: i32,
    pub height: i32,
    pub passable: Vec<bool>,
    pub ore: Vec<u32>,
    pub stockpile_red: u32,
    pub stockpile_blue: u32,
    pub units: Vec<UnitSnapshot>,
    pub pods: Vec<PodSnapshot>,
}

fn snapshot_dir() -> PathBuf {
    PathBuf::from(".gridmind")
}

pub fn snapshot_file_path() -> PathBuf {
    snapshot_dir().join("world_snapshot.json")
}

pub fn snapshots_dir() -> PathBuf {
    snapshot_dir().join("world_snapshots")
}

pub fn capture(world: &SimWorld, coordinator: &Coordinator) -> WorldSnapshot {
    let mut units = Vec::new();
    for team in [Team::Red, Team::Blue] {
        for id in world.units_of(team) {
            let (Some(kind), Some(spot)) = (world.kind_of(id), world.spot_of(id)) else {
                continue;
            };
            units.push(UnitSnapshot {
                id,
                team,
                kind,
                spot,
                built: world.is_built(id),
                producing: world.is_producing(id),
            });
        }
    }
    units.sort_by_key(|u| u.id);

    let pods = coordinator
        .pods()
        .iter()
        .map(|pod| PodSnapshot {
            members: pod.members.clone(),
            order: pod.order,
            build_target: pod.build_target,
            mine_target: pod.mine_target,
        })
        .collect();

    WorldSnapshot {
        step: world.step_count(),
        width: world.width(),
        height: world.height(),
        passable: world.passable_table(),
        ore: world.ore_table(),
        stockpile_red: world.stockpile_of(Team::Red),
        stockpile_blue: world.stockpile_of(Team::Blue),
        units,
        pods,
    }
}

pub fn save_snapshot(snapshot: &WorldSnapshot) -> io::Result<PathBuf> {
    let path = snapshot_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(snapshot)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Per-step archive next to the rolling latest file.
pub fn save_snapshot_step(snapshot: &WorldSnapshot) -> io::Result<PathBuf> {
    let dir = snapshots_dir();
    fs::create_dir_all(&dir)?;
    let filename = format!("step_{:06}.json", snapshot.step);
    let path = dir.join(filename);
    let json = serde_json::to_vec_pretty(snapshot)?;
    fs::write(&path, json)?;
    Ok(path)
}

pub fn load_snapshot() -> io::Result<Option<WorldSnapshot>> {
    let path = snapshot_file_path();
    if !path.exists() {
        return load_latest_snapshot_from_dir();
    }
    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return load_latest_snapshot_from_dir();
    }
    let snapshot = serde_json::from_slice(&bytes)?;
    Ok(Some(snapshot))
}

pub fn load_latest_snapshot_from_dir() -> io::Result<Option<WorldSnapshot>> {
    let dir = snapshots_dir();
    let mut latest: Option<PathBuf> = None;
    if let Ok(entries) = fs::read_dir(&dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                match &latest {
                    Some(current) => {
                        if path > *current {
                            latest = Some(path);
                        }
                    }
                    None => latest = Some(path),
                }
            }
        }
    }

    let Some(path) = latest else {
        return Ok(None);
    };

    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    let snapshot = serde_json::from_slice(&bytes)?;
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::grid::Grid;

    #[test]
    fn capture_lists_every_unit_once() {
        let mut world = SimWorld::open(6, 6);
        let red = world.spawn_worker(Team::Red, Cell::new(1, 1)).unwrap();
        let blue = world.spawn_worker(Team::Blue, Cell::new(4, 4)).unwrap();
        let grid = Grid::new(6, 6, world.passable_table(), world.ore_table());
        let coordinator = Coordinator::bootstrap(&world, &grid, Team::Red);

        let snapshot = capture(&world, &coordinator);
        let ids: Vec<u32> = snapshot.units.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![red, blue]);
        assert_eq!(snapshot.pods.len(), 1);
        assert_eq!(snapshot.pods[0].members, vec![red]);
        assert_eq!(snapshot.pods[0].order, Order::Build);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut world = SimWorld::open(4, 4);
        world.spawn_worker(Team::Red, Cell::new(1, 1)).unwrap();
        world.set_ore(Cell::new(2, 2), 12);
        let grid = Grid::new(4, 4, world.passable_table(), world.ore_table());
        let coordinator = Coordinator::bootstrap(&world, &grid, Team::Red);

        let snapshot = capture(&world, &coordinator);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: WorldSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.step, snapshot.step);
        assert_eq!(back.ore, snapshot.ore);
        assert_eq!(back.units.len(), snapshot.units.len());
        assert_eq!(back.pods[0].order, Order::Build);
    }
}
