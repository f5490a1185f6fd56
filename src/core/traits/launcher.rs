use crate::core::{
    domain::{RunConfig, RunResult},
    errors::LaunchError,
};

/// Starts the container for a prepared workspace and captures its output.
///
/// A non-zero exit is not an error: it is recorded in [`RunResult::exit`].
#[mockall::automock]
#[async_trait::async_trait]
pub trait Launcher: std::fmt::Debug + Send + Sync {
    async fn run(&self, config: &RunConfig) -> Result<RunResult, LaunchError>;
}
