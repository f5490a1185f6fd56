use crate::core::{
    domain::{RunKey, TelemetryEntry},
    errors::TelemetryWriteError,
};

/// Append-only backing store for run telemetry.
#[mockall::automock]
#[async_trait::async_trait]
pub trait TelemetryStore: std::fmt::Debug + Send + Sync {
    async fn put(&self, key: &RunKey, entry: &TelemetryEntry) -> Result<(), TelemetryWriteError>;
}
