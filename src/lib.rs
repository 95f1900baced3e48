pub mod agents;
pub mod browse;
pub mod cli;
pub mod config;
pub mod engine;
pub mod logging;
pub mod sandbox;
pub mod server;
