// Frameworks layer: runtime setup, configuration and the terminal entry point.

pub mod app;
pub mod config;
