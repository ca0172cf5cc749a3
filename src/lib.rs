pub mod agents;
pub mod app;
pub mod cli;
pub mod config;
pub mod connectors;
pub mod doctor;
pub mod error;
pub mod mcp;
pub mod provider;
pub mod runner;
pub mod telemetry;
pub mod theme;
pub mod tools;
pub mod workflows;

#[cfg(test)]
mod tests;
