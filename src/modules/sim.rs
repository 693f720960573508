use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::modules::direction::Direction;
use crate::modules::game::{GameWorld, Spot, Team, UnitId, UnitKind};
use crate::modules::grid::Cell;
use crate::modules::navigator::Symmetry;

/// Squared sensor range of a single unit.
pub const SENSE_RANGE_SQ: i64 = 50;
/// Ore gathered per harvest action.
pub const HARVEST_AMOUNT: u32 = 3;
/// Stockpile cost of founding a new factory.
pub const FOUND_COST: u32 = 15;
/// Stockpile cost of producing a worker.
pub const PRODUCE_COST: u32 = 10;
/// Steps a factory spends producing one worker.
pub const PRODUCE_TIME: u32 = 5;
/// Build actions needed to complete a factory.
pub const BUILD_WORK: u32 = 4;
/// Ore each team starts with.
pub const STARTING_ORE: u32 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Moved {
        unit: UnitId,
        from: Cell,
        to: Cell,
    },
    Founded {
        worker: UnitId,
        factory: UnitId,
        cell: Cell,
    },
    BuildAdvanced {
        factory: UnitId,
        progress: u32,
    },
    Completed {
        factory: UnitId,
    },
    Harvested {
        worker: UnitId,
        cell: Cell,
        amount: u32,
        remaining: u32,
    },
    Produced {
        factory: UnitId,
        worker: UnitId,
    },
    Released {
        factory: UnitId,
        unit: UnitId,
        cell: Cell,
    },
}

#[derive(Clone, Debug)]
struct Unit {
    id: UnitId,
    team: Team,
    kind: UnitKind,
    spot: Spot,
    build_progress: u32,
    producing: Option<u32>,
    garrison: Vec<UnitId>,
}

impl Unit {
    fn is_built(&self) -> bool {
        match self.kind {
            UnitKind::Worker => true,
            UnitKind::Factory => self.build_progress >= BUILD_WORK,
        }
    }
}

/// In-process game world: a mirrored map, two teams, workers and factories.
/// Stands in for the engine the decision core would normally talk to, with
/// the same legality-checked action surface.
#[derive(Clone, Debug)]
pub struct SimWorld {
    width: i32,
    height: i32,
    step: u64,
    passable: Vec<bool>,
    ore: Vec<u32>,
    stockpile: HashMap<Team, u32>,
    units: HashMap<UnitId, Unit>,
    occupied: HashMap<Cell, UnitId>,
    next_unit_id: UnitId,
    events: Vec<Event>,
}

impl SimWorld {
    pub fn new(width: i32, height: i32, passable: Vec<bool>, ore: Vec<u32>) -> Self {
        let cells = (width as usize) * (height as usize);
        assert_eq!(passable.len(), cells, "passability table size mismatch");
        assert_eq!(ore.len(), cells, "ore table size mismatch");
        let mut stockpile = HashMap::new();
        stockpile.insert(Team::Red, STARTING_ORE);
        stockpile.insert(Team::Blue, STARTING_ORE);
        Self {
            width,
            height,
            step: 0,
            passable,
            ore,
            stockpile,
            units: HashMap::new(),
            occupied: HashMap::new(),
            next_unit_id: 1,
            events: Vec::new(),
        }
    }

    pub fn open(width: i32, height: i32) -> Self {
        let cells = (width as usize) * (height as usize);
        Self::new(width, height, vec![true; cells], vec![0; cells])
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn passable_table(&self) -> Vec<bool> {
        self.passable.clone()
    }

    pub fn ore_table(&self) -> Vec<u32> {
        self.ore.clone()
    }

    pub fn stockpile_of(&self, team: Team) -> u32 {
        self.stockpile.get(&team).copied().unwrap_or(0)
    }

    pub fn set_stockpile(&mut self, team: Team, amount: u32) {
        self.stockpile.insert(team, amount);
    }

    pub fn set_ore(&mut self, cell: Cell, quantity: u32) {
        if let Some(index) = self.index(cell) {
            self.ore[index] = quantity;
        }
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn unit_count(&self, team: Team, kind: UnitKind) -> usize {
        self.units
            .values()
            .filter(|u| u.team == team && u.kind == kind)
            .count()
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            return None;
        }
        Some((cell.y * self.width + cell.x) as usize)
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        self.index(cell).is_some()
    }

    fn is_passable(&self, cell: Cell) -> bool {
        self.index(cell).map(|i| self.passable[i]).unwrap_or(false)
    }

    fn is_open(&self, cell: Cell) -> bool {
        self.is_passable(cell) && !self.occupied.contains_key(&cell)
    }

    /// Place a worker at the nearest open cell to `cell`, scanning outward in
    /// square rings so two spawns never share coordinates. `None` when the
    /// whole map is blocked or occupied.
    pub fn spawn_worker(&mut self, team: Team, cell: Cell) -> Option<UnitId> {
        let pos = self.nearest_open(cell)?;

        let id = self.next_unit_id;
        self.next_unit_id += 1;
        self.units.insert(
            id,
            Unit {
                id,
                team,
                kind: UnitKind::Worker,
                spot: Spot::OnMap(pos),
                build_progress: 0,
                producing: None,
                garrison: Vec::new(),
            },
        );
        self.occupied.insert(pos, id);
        Some(id)
    }

    fn nearest_open(&self, cell: Cell) -> Option<Cell> {
        let max_radius = self.width.max(self.height);
        for radius in 0..=max_radius {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs().max(dy.abs()) != radius {
                        continue;
                    }
                    let candidate = Cell::new(cell.x + dx, cell.y + dy);
                    if self.is_open(candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    pub fn remove_unit(&mut self, id: UnitId) {
        if let Some(unit) = self.units.remove(&id) {
            if let Spot::OnMap(cell) = unit.spot {
                self.occupied.remove(&cell);
            }
        }
    }

    fn spend(&mut self, team: Team, amount: u32) -> bool {
        let Some(stock) = self.stockpile.get_mut(&team) else {
            return false;
        };
        if *stock < amount {
            return false;
        }
        *stock -= amount;
        true
    }
}

impl GameWorld for SimWorld {
    fn unit_exists(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    fn spot_of(&self, id: UnitId) -> Option<Spot> {
        self.units.get(&id).map(|u| u.spot)
    }

    fn team_of(&self, id: UnitId) -> Option<Team> {
        self.units.get(&id).map(|u| u.team)
    }

    fn kind_of(&self, id: UnitId) -> Option<UnitKind> {
        self.units.get(&id).map(|u| u.kind)
    }

    fn units_of(&self, team: Team) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.team == team)
            .map(|u| u.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn units_near(&self, cell: Cell, dist_sq: i64, team: Team) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.team == team)
            .filter(|u| match u.spot {
                Spot::OnMap(at) => at.distance_squared(cell) <= dist_sq,
                Spot::Garrisoned(_) => false,
            })
            .map(|u| u.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn can_sense(&self, team: Team, cell: Cell) -> bool {
        self.units.values().any(|u| {
            u.team == team
                && match u.spot {
                    Spot::OnMap(at) => at.distance_squared(cell) <= SENSE_RANGE_SQ,
                    Spot::Garrisoned(_) => false,
                }
        })
    }

    fn ore_at(&self, cell: Cell) -> u32 {
        self.index(cell).map(|i| self.ore[i]).unwrap_or(0)
    }

    fn is_built(&self, id: UnitId) -> bool {
        self.units.get(&id).map(|u| u.is_built()).unwrap_or(false)
    }

    fn is_producing(&self, id: UnitId) -> bool {
        self.units
            .get(&id)
            .map(|u| u.producing.is_some())
            .unwrap_or(false)
    }

    fn can_move(&self, id: UnitId, dir: Direction) -> bool {
        let Some(unit) = self.units.get(&id) else {
            return false;
        };
        if unit.kind != UnitKind::Worker || dir == Direction::Center {
            return false;
        }
        match unit.spot {
            Spot::OnMap(cell) => self.is_open(cell.offset(dir)),
            Spot::Garrisoned(_) => false,
        }
    }

    fn do_move(&mut self, id: UnitId, dir: Direction) {
        if !self.can_move(id, dir) {
            return;
        }
        let unit = self.units.get_mut(&id).expect("checked by can_move");
        let Spot::OnMap(from) = unit.spot else {
            return;
        };
        let to = from.offset(dir);
        unit.spot = Spot::OnMap(to);
        self.occupied.remove(&from);
        self.occupied.insert(to, id);
        self.events.push(Event::Moved { unit: id, from, to });
    }

    fn can_build(&self, worker: UnitId, target: UnitId) -> bool {
        let (Some(builder), Some(site)) = (self.units.get(&worker), self.units.get(&target)) else {
            return false;
        };
        if builder.kind != UnitKind::Worker
            || site.kind != UnitKind::Factory
            || builder.team != site.team
            || site.is_built()
        {
            return false;
        }
        match (builder.spot, site.spot) {
            (Spot::OnMap(a), Spot::OnMap(b)) => a.distance_squared(b) <= 2,
            _ => false,
        }
    }

    fn do_build(&mut self, worker: UnitId, target: UnitId) {
        if !self.can_build(worker, target) {
            return;
        }
        let site = self.units.get_mut(&target).expect("checked by can_build");
        site.build_progress += 1;
        let progress = site.build_progress;
        self.events.push(Event::BuildAdvanced {
            factory: target,
            progress,
        });
        if progress == BUILD_WORK {
            self.events.push(Event::Completed { factory: target });
        }
    }

    fn can_found(&self, worker: UnitId, dir: Direction) -> bool {
        let Some(unit) = self.units.get(&worker) else {
            return false;
        };
        if unit.kind != UnitKind::Worker || dir == Direction::Center {
            return false;
        }
        if self.stockpile_of(unit.team) < FOUND_COST {
            return false;
        }
        match unit.spot {
            Spot::OnMap(cell) => self.is_open(cell.offset(dir)),
            Spot::Garrisoned(_) => false,
        }
    }

    fn do_found(&mut self, worker: UnitId, dir: Direction) -> Option<UnitId> {
        if !self.can_found(worker, dir) {
            return None;
        }
        let (team, cell) = {
            let unit = self.units.get(&worker).expect("checked by can_found");
            let Spot::OnMap(cell) = unit.spot else {
                return None;
            };
            (unit.team, cell.offset(dir))
        };
        if !self.spend(team, FOUND_COST) {
            return None;
        }

        let id = self.next_unit_id;
        self.next_unit_id += 1;
        self.units.insert(
            id,
            Unit {
                id,
                team,
                kind: UnitKind::Factory,
                spot: Spot::OnMap(cell),
                build_progress: 0,
                producing: None,
                garrison: Vec::new(),
            },
        );
        self.occupied.insert(cell, id);
        self.events.push(Event::Founded {
            worker,
            factory: id,
            cell,
        });
        Some(id)
    }

    fn can_harvest(&self, worker: UnitId, dir: Direction) -> bool {
        let Some(unit) = self.units.get(&worker) else {
            return false;
        };
        if unit.kind != UnitKind::Worker {
            return false;
        }
        match unit.spot {
            Spot::OnMap(cell) => {
                let target = cell.offset(dir);
                self.in_bounds(target) && self.ore_at(target) > 0
            }
            Spot::Garrisoned(_) => false,
        }
    }

    fn do_harvest(&mut self, worker: UnitId, dir: Direction) {
        if !self.can_harvest(worker, dir) {
            return;
        }
        let (team, target) = {
            let unit = self.units.get(&worker).expect("checked by can_harvest");
            let Spot::OnMap(cell) = unit.spot else {
                return;
            };
            (unit.team, cell.offset(dir))
        };
        let Some(index) = self.index(target) else {
            return;
        };
        let amount = self.ore[index].min(HARVEST_AMOUNT);
        self.ore[index] -= amount;
        let remaining = self.ore[index];
        if let Some(stock) = self.stockpile.get_mut(&team) {
            *stock = stock.saturating_add(amount);
        }
        self.events.push(Event::Harvested {
            worker,
            cell: target,
            amount,
            remaining,
        });
    }

    fn can_produce(&self, factory: UnitId) -> bool {
        let Some(unit) = self.units.get(&factory) else {
            return false;
        };
        unit.kind == UnitKind::Factory
            && unit.is_built()
            && unit.producing.is_none()
            && self.stockpile_of(unit.team) >= PRODUCE_COST
    }

    fn do_produce(&mut self, factory: UnitId) {
        if !self.can_produce(factory) {
            return;
        }
        let team = self.units[&factory].team;
        if !self.spend(team, PRODUCE_COST) {
            return;
        }
        if let Some(unit) = self.units.get_mut(&factory) {
            unit.producing = Some(PRODUCE_TIME);
        }
    }

    fn can_release(&self, factory: UnitId, dir: Direction) -> bool {
        let Some(unit) = self.units.get(&factory) else {
            return false;
        };
        if unit.kind != UnitKind::Factory
            || !unit.is_built()
            || unit.garrison.is_empty()
            || dir == Direction::Center
        {
            return false;
        }
        match unit.spot {
            Spot::OnMap(cell) => self.is_open(cell.offset(dir)),
            Spot::Garrisoned(_) => false,
        }
    }

    fn do_release(&mut self, factory: UnitId, dir: Direction) {
        if !self.can_release(factory, dir) {
            return;
        }
        let (passenger, cell) = {
            let unit = self.units.get_mut(&factory).expect("checked by can_release");
            let Spot::OnMap(cell) = unit.spot else {
                return;
            };
            (unit.garrison.remove(0), cell.offset(dir))
        };
        if let Some(unit) = self.units.get_mut(&passenger) {
            unit.spot = Spot::OnMap(cell);
        }
        self.occupied.insert(cell, passenger);
        self.events.push(Event::Released {
            factory,
            unit: passenger,
            cell,
        });
    }

    fn advance(&mut self) {
        self.step += 1;

        // Tick down production; a finished worker lands in the garrison and
        // waits for a release action.
        let producing: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.producing.is_some())
            .map(|u| u.id)
            .collect();
        for id in producing {
            let (done, team) = {
                let unit = self.units.get_mut(&id).expect("listed above");
                let remaining = unit.producing.expect("listed above").saturating_sub(1);
                if remaining == 0 {
                    unit.producing = None;
                    (true, unit.team)
                } else {
                    unit.producing = Some(remaining);
                    (false, unit.team)
                }
            };
            if done {
                let worker = self.next_unit_id;
                self.next_unit_id += 1;
                self.units.insert(
                    worker,
                    Unit {
                        id: worker,
                        team,
                        kind: UnitKind::Worker,
                        spot: Spot::Garrisoned(id),
                        build_progress: 0,
                        producing: None,
                        garrison: Vec::new(),
                    },
                );
                if let Some(factory) = self.units.get_mut(&id) {
                    factory.garrison.push(worker);
                }
                self.events.push(Event::Produced {
                    factory: id,
                    worker,
                });
            }
        }
    }
}

/// Generate a mirrored random map: obstacles and ore patches are rolled for
/// one hemisphere and reflected into the other, so the configured symmetry
/// actually holds on the produced tables.
pub fn generate_map(
    width: i32,
    height: i32,
    seed: u64,
    symmetry: Symmetry,
) -> (Vec<bool>, Vec<u32>) {
    let cells = (width as usize) * (height as usize);
    let mut passable = vec![true; cells];
    let mut ore = vec![0u32; cells];
    let mut rng = StdRng::seed_from_u64(seed);

    let (x_limit, y_limit) = match symmetry {
        Symmetry::Horizontal => ((width + 1) / 2, height),
        Symmetry::Vertical | Symmetry::Rotated => (width, (height + 1) / 2),
    };

    for y in 0..y_limit {
        for x in 0..x_limit {
            let cell = Cell::new(x, y);
            let mirror = symmetry.mirror_cell(cell, width, height);
            let wall = rng.gen_bool(0.12);
            let quantity = if !wall && rng.gen_bool(0.15) {
                rng.gen_range(5..40)
            } else {
                0
            };
            for c in [cell, mirror] {
                let index = (c.y * width + c.x) as usize;
                passable[index] = !wall;
                ore[index] = quantity;
            }
        }
    }

    // Keep the canonical spawn corners open on both hemispheres.
    for cell in [Cell::new(1, 1), symmetry.mirror_cell(Cell::new(1, 1), width, height)] {
        let index = (cell.y * width + cell.x) as usize;
        passable[index] = true;
    }

    (passable, ore)
}
