pub mod fixtures;
pub mod launcher;
pub mod telemetry;
