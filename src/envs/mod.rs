pub mod board;
pub mod cell;
pub mod grid_world;
