use std::path::{Component, Path, PathBuf};

use tokio::fs;

use crate::core::{errors::FixtureError, traits::fixtures::FixtureSource};

/// Serves fixtures from files below a root directory.
#[derive(Clone, Debug)]
pub struct FsFixtureSource {
    root: PathBuf,
}

impl FsFixtureSource {
    pub fn new<T: AsRef<Path>>(root: T) -> Self {
        Self {
            root: root.as_ref().into(),
        }
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, FixtureError> {
        let relative = Path::new(reference);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || reference.is_empty() {
            return Err(FixtureError::OutsideRoot {
                reference: reference.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl FixtureSource for FsFixtureSource {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, reference: &str) -> Result<String, FixtureError> {
        let path = self.resolve(reference)?;
        fs::read_to_string(&path)
            .await
            .map_err(|source| FixtureError::Read {
                reference: reference.to_string(),
                source,
            })
    }
}
