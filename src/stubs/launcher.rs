use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;

use crate::core::{
    domain::{RunConfig, RunResult},
    errors::LaunchError,
    traits::launcher::Launcher,
};

/// Pretends to run a container: sleeps, drops the configured artifacts into
/// the workspace and returns canned output.
#[derive(Debug, Clone)]
pub struct LauncherStub {
    stdout: String,
    stderr: String,
    exit: String,
    delay: Duration,
    echo: bool,
    artifacts: Vec<(PathBuf, String)>,
}

impl LauncherStub {
    pub fn new(stdout: &str, stderr: &str, exit: &str, delay: Duration) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit: exit.to_string(),
            delay,
            echo: false,
            artifacts: Vec::new(),
        }
    }

    /// Returns the submitted code as stdout.
    pub fn echo(delay: Duration) -> Self {
        Self {
            echo: true,
            ..Self::new("", "", "", delay)
        }
    }

    pub fn with_artifact(mut self, relative: &str, contents: &str) -> Self {
        self.artifacts.push((relative.into(), contents.to_string()));
        self
    }

    pub fn result_for(&self, config: &RunConfig) -> RunResult {
        let now = Utc::now();
        RunResult {
            config: config.clone(),
            stdout: if self.echo {
                config.code.clone()
            } else {
                self.stdout.clone()
            },
            stderr: self.stderr.clone(),
            usage: Default::default(),
            prepare_log: String::new(),
            started_at: now,
            ended_at: now,
            exit: self.exit.clone(),
        }
    }

    async fn write_artifacts(&self, config: &RunConfig) {
        for (relative, contents) in &self.artifacts {
            let path = config.workspace.join(relative);
            if let Some(parent) = path.parent() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    tracing::warn!(path = %parent.display(), error = %e, "Failed to create artifact dir");
                    continue;
                }
            }
            if let Err(e) = tokio::fs::write(&path, contents).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write artifact");
            }
        }
    }
}

#[async_trait::async_trait]
impl Launcher for LauncherStub {
    #[tracing::instrument(skip(self))]
    async fn run(&self, config: &RunConfig) -> Result<RunResult, LaunchError> {
        tracing::debug!("Start run: image={:?}", config.image);
        let started_at = Utc::now();
        tokio::time::sleep(self.delay).await;
        self.write_artifacts(config).await;
        let mut result = self.result_for(config);
        result.started_at = started_at;
        tracing::debug!("Run result: {:?}", result.exit);

        Ok(result)
    }
}
