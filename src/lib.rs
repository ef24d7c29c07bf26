pub mod app;
pub mod bounds;
pub mod camera3d;
pub mod cli;
pub mod config;
pub mod editing;
pub mod element;
pub mod input;
pub mod persist;
pub mod picking;
pub mod renderer;
pub mod scene;
pub mod screen;
pub mod workspace;

pub use app::{run, run_with_options, App};
