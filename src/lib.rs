pub mod classifier;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod errors;
pub mod fixes;
pub mod git;
pub mod github;
pub mod orchestrator;
pub mod pull_request;
pub mod report;
pub mod runner;
pub mod ui;

#[cfg(test)]
mod testing;
