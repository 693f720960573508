pub mod deposits;
pub mod direction;
pub mod game;
pub mod grid;
pub mod navigator;
pub mod pathfinder;
pub mod pods;
pub mod sim;
pub mod snapshot;
