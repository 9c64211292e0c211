pub mod assets;
pub mod config;
pub mod mode;
pub mod renderer;
pub mod sim;
pub mod world;
