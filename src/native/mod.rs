pub mod docker;
pub mod fixtures;
pub mod telemetry;
