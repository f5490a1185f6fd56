use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;

use crate::{
    constants::VOLUME_PREFIX,
    core::{domain::LanguageTable, errors::RunError},
};

/// Private directory of one run. Removed from disk when dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `relative` inside the workspace, creating parent
    /// directories as needed.
    pub async fn write_file(
        &self,
        relative: impl AsRef<Path>,
        contents: &str,
    ) -> Result<PathBuf, RunError> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| RunError::WorkspacePreparation {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        fs::write(&path, contents)
            .await
            .map_err(|source| RunError::WorkspacePreparation {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

#[derive(Clone, Debug)]
pub struct WorkspaceManager {
    root: PathBuf,
    languages: LanguageTable,
}

impl WorkspaceManager {
    pub fn new(root: impl AsRef<Path>, languages: LanguageTable) -> Self {
        Self {
            root: root.as_ref().into(),
            languages,
        }
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    /// Allocates a fresh workspace and writes `code` into it under the file
    /// name mapped to `language`.
    pub async fn prepare(&self, code: &str, language: &str) -> Result<Workspace, RunError> {
        let file_name = self.languages.file_name(language)?;
        self.prepare_at(code, file_name).await
    }

    /// Allocates a fresh workspace and writes `code` to `relative` inside it,
    /// regardless of language.
    #[tracing::instrument(skip(self, code, relative))]
    pub async fn prepare_at(
        &self,
        code: &str,
        relative: impl AsRef<Path>,
    ) -> Result<Workspace, RunError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| RunError::WorkspacePreparation {
                path: self.root.clone(),
                source,
            })?;
        let dir = tempfile::Builder::new()
            .prefix(VOLUME_PREFIX)
            .tempdir_in(&self.root)
            .map_err(|source| RunError::WorkspacePreparation {
                path: self.root.clone(),
                source,
            })?;
        let workspace = Workspace { dir };

        let source_path = workspace.write_file(relative, code).await?;
        tracing::debug!(path = %source_path.display(), "Workspace prepared");

        Ok(workspace)
    }
}
