use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use gridmind::{
    Cell, Coordinator, GameWorld, Grid, Navigator, SimWorld, Symmetry, Team, UnitKind, capture,
    generate_map, save_snapshot, save_snapshot_step,
};

mod inspect;
mod map;

use inspect::run_inspect;
use map::run_map;

#[derive(Parser)]
#[command(
    name = "gridmind",
    version,
    about = "Gridmind sandbox CLI (pods, navigation, mining)",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the decision loop on a generated map
    Run {
        /// Map width in cells
        #[arg(long, default_value_t = 20)]
        width: i32,
        /// Map height in cells
        #[arg(long, default_value_t = 20)]
        height: i32,
        /// RNG seed for map generation (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Number of steps to run
        #[arg(short = 't', long, default_value_t = 200)]
        steps: u64,
        /// Map symmetry
        #[arg(long, value_enum, default_value = "rotated")]
        symmetry: Symmetry,
        /// Starting workers per team
        #[arg(long, default_value_t = 3)]
        workers: u32,
        /// Write a snapshot every N steps (0 disables per-step snapshots)
        #[arg(long, default_value_t = 0)]
        snapshot_every: u64,
        /// Delay between steps in milliseconds
        #[arg(short = 'd', long, default_value_t = 0)]
        delay_ms: u64,
    },
    /// Generate a map and print it
    Map {
        /// Map width in cells
        #[arg(long, default_value_t = 20)]
        width: i32,
        /// Map height in cells
        #[arg(long, default_value_t = 20)]
        height: i32,
        /// RNG seed for map generation (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Map symmetry
        #[arg(long, value_enum, default_value = "rotated")]
        symmetry: Symmetry,
    },
    /// Show the latest persisted snapshot
    Inspect {
        /// Print the snapshot JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli.command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<(), String> {
    match command {
        Command::Run {
            width,
            height,
            seed,
            steps,
            symmetry,
            workers,
            snapshot_every,
            delay_ms,
        } => run_run(
            width,
            height,
            seed,
            steps,
            symmetry,
            workers,
            snapshot_every,
            delay_ms,
        ),
        Command::Map {
            width,
            height,
            seed,
            symmetry,
        } => run_map(width, height, seed, symmetry),
        Command::Inspect { json } => run_inspect(json),
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn run_run(
    width: i32,
    height: i32,
    seed: Option<u64>,
    steps: u64,
    symmetry: Symmetry,
    workers: u32,
    snapshot_every: u64,
    delay_ms: u64,
) -> Result<(), String> {
    if width < 4 || height < 4 {
        return Err("map must be at least 4x4".into());
    }

    let seed = seed.unwrap_or_else(rand::random);
    let (passable, ore) = generate_map(width, height, seed, symmetry);
    let mut world = SimWorld::new(width, height, passable.clone(), ore.clone());

    let red_home = Cell::new(1, 1);
    let blue_home = symmetry.mirror_cell(red_home, width, height);
    for _ in 0..workers {
        let red_spawn = world.spawn_worker(Team::Red, red_home);
        let blue_spawn = world.spawn_worker(Team::Blue, blue_home);
        if red_spawn.is_none() || blue_spawn.is_none() {
            return Err("no open cells left to place starting workers".into());
        }
    }

    // Each team keeps its own belief about the ore on the map; passability
    // is shared ground truth, so one set of direction fields serves both.
    let mut red_grid = Grid::new(width, height, passable.clone(), ore.clone());
    let mut blue_grid = Grid::new(width, height, passable, ore);
    let mut navigator = Navigator::new();
    navigator.precompute(&red_grid, symmetry);

    println!(
        "[{}] map {}x{} seed={} | {} direction field(s) precomputed",
        timestamp(),
        width,
        height,
        seed,
        navigator.cache().len()
    );

    let mut red = Coordinator::bootstrap(&world, &red_grid, Team::Red);
    let mut blue = Coordinator::bootstrap(&world, &blue_grid, Team::Blue);
    println!(
        "[{}] pods formed | red={} blue={}",
        timestamp(),
        red.pods().len(),
        blue.pods().len()
    );

    let mut faults = 0u64;
    for step in 1..=steps {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            red.step(&mut world, &mut red_grid, &navigator);
            blue.step(&mut world, &mut blue_grid, &navigator);
            world.advance();
        }));
        if outcome.is_err() {
            faults += 1;
            eprintln!("warning: step {} panicked; continuing with the next step", step);
        }

        let events = world.drain_events();
        println!(
            "[{}] step {} | events={} | red units={} stock={} | blue units={} stock={}",
            timestamp(),
            step,
            events.len(),
            world.units_of(Team::Red).len(),
            world.stockpile_of(Team::Red),
            world.units_of(Team::Blue).len(),
            world.stockpile_of(Team::Blue),
        );

        if snapshot_every > 0 && step % snapshot_every == 0 {
            persist_snapshot(&world, &red);
        }

        if delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(delay_ms));
        }
    }

    persist_snapshot(&world, &red);

    println!("Done after {} step(s). faults={}", steps, faults);
    for team in [Team::Red, Team::Blue] {
        println!(
            " - {}: workers={} factories={} stockpile={}",
            team,
            world.unit_count(team, UnitKind::Worker),
            world.unit_count(team, UnitKind::Factory),
            world.stockpile_of(team)
        );
    }
    Ok(())
}

fn persist_snapshot(world: &SimWorld, coordinator: &Coordinator) {
    let snapshot = capture(world, coordinator);
    if let Err(err) = save_snapshot(&snapshot) {
        eprintln!("warning: failed to write world snapshot: {}", err);
    }
    if let Err(err) = save_snapshot_step(&snapshot) {
        eprintln!("warning: failed to write step snapshot: {}", err);
    }
}
