use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modules::deposits::density_at;
use crate::modules::direction::Direction;
use crate::modules::game::{GameWorld, Team, UnitId, UnitKind};
use crate::modules::grid::{Cell, Grid};
use crate::modules::navigator::Navigator;

/// Two units closer than this (squared distance) are podmates.
pub const POD_RANGE_SQ: i64 = 16;
/// Window half-width used to score a pod's home region for mining.
const POD_DENSITY_RADIUS: i32 = 5;

/// A pod's standing order, assigned once at game start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Build,
    Mine,
}

impl Order {
    pub const fn label(self) -> &'static str {
        match self {
            Order::Build => "build",
            Order::Mine => "mine",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A cooperative group of workers. Membership is fixed at formation except
/// for dead units being pruned; pods never merge or split.
#[derive(Clone, Debug)]
pub struct Pod {
    pub members: Vec<UnitId>,
    pub order: Order,
    pub build_target: Option<UnitId>,
    pub mine_target: Option<Cell>,
}

impl Pod {
    pub fn new(members: Vec<UnitId>, order: Order) -> Self {
        Self {
            members,
            order,
            build_target: None,
            mine_target: None,
        }
    }
}

/// Partition `team`'s workers into pods: connected components of the
/// proximity graph where edges join units within `range_sq`.
pub fn build_pods<W: GameWorld>(world: &W, team: Team, range_sq: i64) -> Vec<Vec<UnitId>> {
    let mut pods = Vec::new();
    let mut processed: HashSet<UnitId> = HashSet::new();

    for id in world.units_of(team) {
        if world.kind_of(id) != Some(UnitKind::Worker) || processed.contains(&id) {
            continue;
        }

        let mut pod = Vec::new();
        let mut stack = vec![id];
        while let Some(unit) = stack.pop() {
            if !processed.insert(unit) {
                continue;
            }
            pod.push(unit);

            let Some(cell) = world.spot_of(unit).and_then(|s| s.on_map()) else {
                continue;
            };
            for nearby in world.units_near(cell, range_sq, team) {
                if world.kind_of(nearby) == Some(UnitKind::Worker) && !processed.contains(&nearby)
                {
                    stack.push(nearby);
                }
            }
        }
        pods.push(pod);
    }

    pods
}

/// Nearest cell with positive believed ore, by unweighted 8-connected BFS
/// from `start`. Falls back to `start` itself when the reachable region holds
/// no ore at all, so callers always get a target rather than an error.
pub fn nearest_ore(grid: &Grid, start: Cell) -> Cell {
    let mut open = VecDeque::from([start]);
    let mut closed: HashSet<Cell> = HashSet::from([start]);

    while let Some(next) = open.pop_front() {
        if grid.belief_at(next) > 0 {
            return next;
        }
        for dir in Direction::ALL {
            let adj = next.offset(dir);
            if !grid.in_bounds(adj) || !grid.is_passable(adj) {
                continue;
            }
            if closed.insert(adj) {
                open.push_back(adj);
            }
        }
    }

    start
}

/// Owns every pod for the life of the game and drives per-unit action
/// selection each step.
#[derive(Clone, Debug)]
pub struct Coordinator {
    team: Team,
    pods: Vec<Pod>,
}

impl Coordinator {
    pub fn new(team: Team, pods: Vec<Pod>) -> Self {
        Self { team, pods }
    }

    /// Form pods from the current unit set and hand out initial orders: a
    /// lone pod builds; otherwise everyone builds except the pod whose mean
    /// location sits on the richest ore region, which mines.
    pub fn bootstrap<W: GameWorld>(world: &W, grid: &Grid, team: Team) -> Self {
        let mut pods: Vec<Pod> = build_pods(world, team, POD_RANGE_SQ)
            .into_iter()
            .map(|members| Pod::new(members, Order::Build))
            .collect();

        if pods.len() > 1 {
            let mut best: Option<(usize, u32)> = None;
            for (index, pod) in pods.iter().enumerate() {
                let Some(mean) = mean_location(world, &pod.members) else {
                    continue;
                };
                let value = density_at(grid, mean.x, mean.y, POD_DENSITY_RADIUS);
                if best.is_none_or(|(_, top)| value > top) {
                    best = Some((index, value));
                }
            }
            if let Some((index, _)) = best {
                pods[index].order = Order::Mine;
            }
        }

        Self { team, pods }
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn pods(&self) -> &[Pod] {
        &self.pods
    }

    /// One full decision cycle: refresh belief, drive every pod through its
    /// order, then let finished factories produce and release.
    pub fn step<W: GameWorld>(&mut self, world: &mut W, grid: &mut Grid, navigator: &Navigator) {
        let team = self.team;
        grid.refresh(|cell| world.can_sense(team, cell), |cell| world.ore_at(cell));

        let all_factories_producing = world
            .units_of(team)
            .into_iter()
            .filter(|&id| world.kind_of(id) == Some(UnitKind::Factory))
            .all(|id| world.is_producing(id));

        for pod in &mut self.pods {
            pod.members.retain(|&id| world.unit_exists(id));
            if pod.members.is_empty() {
                // Order and target state stick around in case units return.
                continue;
            }

            match pod.order {
                Order::Build => {
                    step_build_pod(pod, world, grid, navigator, all_factories_producing)
                }
                Order::Mine => step_mine_pod(pod, world, grid, navigator),
            }
        }

        for id in world.units_of(team) {
            if world.kind_of(id) != Some(UnitKind::Factory) || !world.is_built(id) {
                continue;
            }
            if world.can_produce(id) {
                world.do_produce(id);
            }
            for dir in Direction::ALL {
                if world.can_release(id, dir) {
                    world.do_release(id, dir);
                }
            }
        }
    }
}

/// Truncated arithmetic mean of the on-map members' coordinates.
fn mean_location<W: GameWorld>(world: &W, members: &[UnitId]) -> Option<Cell> {
    let mut sum_x = 0i64;
    let mut sum_y = 0i64;
    let mut count = 0i64;
    for &id in members {
        if let Some(cell) = world.spot_of(id).and_then(|s| s.on_map()) {
            sum_x += cell.x as i64;
            sum_y += cell.y as i64;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    Some(Cell::new((sum_x / count) as i32, (sum_y / count) as i32))
}

/// First pod member that is out on the map rather than garrisoned.
fn founder<W: GameWorld>(world: &W, pod: &Pod) -> Option<(UnitId, Cell)> {
    pod.members.iter().find_map(|&id| {
        world
            .spot_of(id)
            .and_then(|s| s.on_map())
            .map(|cell| (id, cell))
    })
}

/// Cache-or-search navigation followed by a guarded move; an unreachable
/// target or illegal move means the unit holds still this step.
fn request_step<W: GameWorld>(
    world: &mut W,
    grid: &Grid,
    navigator: &Navigator,
    unit: UnitId,
    target: Cell,
) {
    let Some(from) = world.spot_of(unit).and_then(|s| s.on_map()) else {
        return;
    };
    let Some(dir) = navigator.step_toward(grid, from, target) else {
        return;
    };
    if world.can_move(unit, dir) {
        world.do_move(unit, dir);
    }
}

fn step_build_pod<W: GameWorld>(
    pod: &mut Pod,
    world: &mut W,
    grid: &Grid,
    navigator: &Navigator,
    all_factories_producing: bool,
) {
    let needs_target = match pod.build_target {
        Some(target) => !world.unit_exists(target) || world.is_built(target),
        None => true,
    };

    if needs_target {
        pod.build_target = None;
        // Only founding when every existing factory is busy producing keeps
        // the pod from blanketing the map in redundant factories.
        if !all_factories_producing {
            return;
        }
        let Some((unit, _)) = founder(world, pod) else {
            return;
        };
        for dir in Direction::ALL {
            if world.can_found(unit, dir) {
                pod.build_target = world.do_found(unit, dir);
                break;
            }
        }
    }

    let Some(target) = pod.build_target else {
        return;
    };
    let Some(site) = world.spot_of(target).and_then(|s| s.on_map()) else {
        return;
    };

    for &unit in &pod.members {
        if world.can_build(unit, target) {
            world.do_build(unit, target);
        } else {
            request_step(world, grid, navigator, unit, site);
        }
    }
}

fn step_mine_pod<W: GameWorld>(
    pod: &mut Pod,
    world: &mut W,
    grid: &mut Grid,
    navigator: &Navigator,
) {
    let needs_target = match pod.mine_target {
        Some(cell) => grid.belief_at(cell) == 0,
        None => true,
    };

    if needs_target {
        let Some((_, at)) = founder(world, pod) else {
            return;
        };
        pod.mine_target = Some(nearest_ore(grid, at));
    }

    let Some(target) = pod.mine_target else {
        return;
    };

    for &unit in &pod.members {
        let Some(from) = world.spot_of(unit).and_then(|s| s.on_map()) else {
            continue;
        };
        let dir = from.direction_to(target);
        if world.can_harvest(unit, dir) {
            world.do_harvest(unit, dir);
            // Our own harvest is a fresh observation; snap belief to truth.
            let mined = from.offset(dir);
            grid.correct(mined, world.ore_at(mined));
        } else {
            request_step(world, grid, navigator, unit, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::game::Spot;
    use crate::modules::sim::{SimWorld, FOUND_COST};

    fn grid_of(world: &SimWorld) -> Grid {
        Grid::new(
            world.width(),
            world.height(),
            world.passable_table(),
            world.ore_table(),
        )
    }

    #[test]
    fn pods_partition_units_by_proximity() {
        let mut world = SimWorld::open(24, 24);
        // Cluster one: a chain where the ends are only connected through the middle.
        let a1 = world.spawn_worker(Team::Red, Cell::new(0, 0)).unwrap();
        let a2 = world.spawn_worker(Team::Red, Cell::new(3, 0)).unwrap();
        let a3 = world.spawn_worker(Team::Red, Cell::new(6, 0)).unwrap();
        // Cluster two, far away.
        let b1 = world.spawn_worker(Team::Red, Cell::new(20, 20)).unwrap();
        let b2 = world.spawn_worker(Team::Red, Cell::new(22, 22)).unwrap();
        // An opposing unit in the middle must not glue anything together.
        world.spawn_worker(Team::Blue, Cell::new(12, 12)).unwrap();

        let mut pods = build_pods(&world, Team::Red, POD_RANGE_SQ);
        for pod in &mut pods {
            pod.sort_unstable();
        }
        pods.sort();

        assert_eq!(pods, vec![vec![a1, a2, a3], vec![b1, b2]]);

        // Partition: every red worker in exactly one pod.
        let mut seen: Vec<UnitId> = pods.concat();
        seen.sort_unstable();
        assert_eq!(seen, world.units_of(Team::Red));
    }

    #[test]
    fn lone_pod_is_ordered_to_build() {
        let mut world = SimWorld::open(8, 8);
        world.spawn_worker(Team::Red, Cell::new(1, 1)).unwrap();
        let grid = grid_of(&world);

        let coordinator = Coordinator::bootstrap(&world, &grid, Team::Red);
        assert_eq!(coordinator.pods().len(), 1);
        assert_eq!(coordinator.pods()[0].order, Order::Build);
        assert_eq!(coordinator.pods()[0].build_target, None);
    }

    #[test]
    fn richest_region_pod_is_ordered_to_mine() {
        let mut world = SimWorld::open(24, 24);
        world.spawn_worker(Team::Red, Cell::new(2, 2)).unwrap();
        world.spawn_worker(Team::Red, Cell::new(3, 2)).unwrap();
        world.spawn_worker(Team::Red, Cell::new(20, 20)).unwrap();
        world.spawn_worker(Team::Red, Cell::new(21, 20)).unwrap();
        world.set_ore(Cell::new(20, 19), 50);
        let grid = grid_of(&world);

        let coordinator = Coordinator::bootstrap(&world, &grid, Team::Red);
        assert_eq!(coordinator.pods().len(), 2);

        let orders: Vec<Order> = coordinator.pods().iter().map(|p| p.order).collect();
        assert_eq!(
            orders.iter().filter(|o| **o == Order::Mine).count(),
            1,
            "exactly one pod mines"
        );
        let mine_pod = coordinator
            .pods()
            .iter()
            .find(|p| p.order == Order::Mine)
            .unwrap();
        assert!(mine_pod.members.len() == 2);
        let near = world
            .spot_of(mine_pod.members[0])
            .unwrap()
            .on_map()
            .unwrap();
        assert!(near.x >= 20, "the pod next to the ore should mine");
    }

    #[test]
    fn build_pod_founds_then_tracks_a_factory_to_completion() {
        let mut world = SimWorld::open(8, 8);
        let worker = world.spawn_worker(Team::Red, Cell::new(1, 1)).unwrap();
        let mut grid = grid_of(&world);
        let navigator = Navigator::new();

        let mut coordinator = Coordinator::bootstrap(&world, &grid, Team::Red);
        assert_eq!(coordinator.pods()[0].build_target, None);

        coordinator.step(&mut world, &mut grid, &navigator);
        let factory = coordinator.pods()[0]
            .build_target
            .expect("a factory should have been founded");
        assert!(!world.is_built(factory));
        assert!(world.can_build(worker, factory));

        // Keep stepping; the lone worker hammers on the site until done.
        for _ in 0..8 {
            coordinator.step(&mut world, &mut grid, &navigator);
            world.advance();
            if world.is_built(factory) {
                break;
            }
        }
        assert!(world.is_built(factory));
    }

    #[test]
    fn empty_pod_is_skipped_but_keeps_its_state() {
        let mut world = SimWorld::open(8, 8);
        let worker = world.spawn_worker(Team::Red, Cell::new(1, 1)).unwrap();
        let mut grid = grid_of(&world);
        let navigator = Navigator::new();

        let mut coordinator = Coordinator::bootstrap(&world, &grid, Team::Red);
        world.remove_unit(worker);
        coordinator.step(&mut world, &mut grid, &navigator);

        assert!(coordinator.pods()[0].members.is_empty());
        assert_eq!(coordinator.pods()[0].order, Order::Build);
    }

    #[test]
    fn mine_pod_abandons_depleted_target_for_the_next_nearest() {
        let mut world = SimWorld::open(12, 12);
        let worker = world.spawn_worker(Team::Red, Cell::new(4, 4)).unwrap();
        world.set_ore(Cell::new(4, 5), 3);
        world.set_ore(Cell::new(8, 8), 9);
        let mut grid = grid_of(&world);
        let navigator = Navigator::new();

        let pod = Pod::new(vec![worker], Order::Mine);
        let mut coordinator = Coordinator::new(Team::Red, vec![pod]);

        coordinator.step(&mut world, &mut grid, &navigator);
        assert_eq!(coordinator.pods()[0].mine_target, Some(Cell::new(4, 5)));
        // One harvest of 3 drains the cell; belief was corrected on the spot.
        assert_eq!(grid.belief_at(Cell::new(4, 5)), 0);

        coordinator.step(&mut world, &mut grid, &navigator);
        assert_eq!(coordinator.pods()[0].mine_target, Some(Cell::new(8, 8)));
    }

    #[test]
    fn mine_pod_with_no_ore_anywhere_targets_its_own_cell() {
        let mut world = SimWorld::open(6, 6);
        let worker = world.spawn_worker(Team::Red, Cell::new(2, 3)).unwrap();
        let mut grid = grid_of(&world);
        let navigator = Navigator::new();

        let pod = Pod::new(vec![worker], Order::Mine);
        let mut coordinator = Coordinator::new(Team::Red, vec![pod]);
        coordinator.step(&mut world, &mut grid, &navigator);

        assert_eq!(coordinator.pods()[0].mine_target, Some(Cell::new(2, 3)));
        // Degenerate target is a standing no-op, not a crash.
        assert_eq!(world.spot_of(worker), Some(Spot::OnMap(Cell::new(2, 3))));
    }

    #[test]
    fn build_pod_does_nothing_without_stockpile() {
        let mut world = SimWorld::open(8, 8);
        world.spawn_worker(Team::Red, Cell::new(1, 1)).unwrap();
        world.set_stockpile(Team::Red, FOUND_COST - 1);
        let mut grid = grid_of(&world);
        let navigator = Navigator::new();

        let mut coordinator = Coordinator::bootstrap(&world, &grid, Team::Red);
        coordinator.step(&mut world, &mut grid, &navigator);
        assert_eq!(coordinator.pods()[0].build_target, None);
    }

    #[test]
    fn dead_members_are_pruned_silently() {
        let mut world = SimWorld::open(16, 16);
        let keep = world.spawn_worker(Team::Red, Cell::new(1, 1)).unwrap();
        let lost = world.spawn_worker(Team::Red, Cell::new(2, 1)).unwrap();
        let mut grid = grid_of(&world);
        let navigator = Navigator::new();

        let mut coordinator = Coordinator::bootstrap(&world, &grid, Team::Red);
        world.remove_unit(lost);
        coordinator.step(&mut world, &mut grid, &navigator);

        assert_eq!(coordinator.pods()[0].members, vec![keep]);
    }
}
