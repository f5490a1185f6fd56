use crate::core::errors::FixtureError;

/// Source of test fixtures: expected output files and unit test sources.
#[mockall::automock]
#[async_trait::async_trait]
pub trait FixtureSource: std::fmt::Debug + Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<String, FixtureError>;
}
