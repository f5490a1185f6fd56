pub mod artifacts;
pub mod drain;
pub mod orchestrator;
pub mod strategy;
pub mod telemetry;
pub mod workspace;
