use std::path::Path;
use std::sync::Arc;

use crate::{
    constants::{JAVA_MAIN_DIR, JAVA_MAIN_FILE, JAVA_TEST_DIR, JAVA_TEST_FILE},
    core::{
        domain::{RunConfig, RunLog, RunRequest, RunnerKind},
        errors::RunError,
        pipeline::{
            artifacts,
            strategy::{RunResponse, Strategy},
            telemetry::TelemetryLogger,
            workspace::{Workspace, WorkspaceManager},
        },
        traits::{fixtures::FixtureSource, launcher::Launcher},
    },
};

const UNKNOWN: &str = "unknown";

/// Drives one run from request to response: workspace, telemetry, launch,
/// artifacts and result strategy.
#[derive(Debug)]
pub struct Orchestrator {
    workspaces: WorkspaceManager,
    image_prefix: String,
    launcher: Arc<dyn Launcher>,
    telemetry: TelemetryLogger,
    fixtures: Arc<dyn FixtureSource>,
}

impl Orchestrator {
    pub fn new(
        workspaces: WorkspaceManager,
        image_prefix: impl Into<String>,
        launcher: Arc<dyn Launcher>,
        telemetry: TelemetryLogger,
        fixtures: Arc<dyn FixtureSource>,
    ) -> Self {
        Self {
            workspaces,
            image_prefix: image_prefix.into(),
            launcher,
            telemetry,
            fixtures,
        }
    }

    #[tracing::instrument(skip_all, fields(language = %request.language, runner = ?request.runner))]
    pub async fn execute(&self, request: RunRequest) -> Result<RunResponse, RunError> {
        let image = self
            .workspaces
            .languages()
            .image(&request.language, &self.image_prefix)?;
        let strategy = self.plan(&request).await?;
        let workspace = self.prepare(&request).await?;

        let config = RunConfig {
            image,
            workspace: workspace.path().to_path_buf(),
            code: request.code.clone(),
            language: request.language.clone(),
            challenge: request.challenge.clone(),
            user: request.user.clone(),
        };

        let started = self
            .telemetry
            .log_start(
                config.challenge.as_deref().unwrap_or(UNKNOWN),
                &config.code,
                config.user.as_deref().unwrap_or(UNKNOWN),
            )
            .await;

        let mut result = match self.launcher.run(&config).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Launch failed");
                self.telemetry
                    .log_complete(started, Some(&e.to_string()))
                    .await;
                return Err(e.into());
            }
        };
        let completed = self
            .telemetry
            .log_complete(started, result.runtime_error())
            .await;

        let (prepare_log, usage) = artifacts::read_artifacts(workspace.path()).await;
        result.prepare_log = prepare_log;
        result.usage = usage;
        let report = if strategy.wants_test_report() {
            Some(artifacts::read_test_report(workspace.path()).await)
        } else {
            None
        };

        let response = strategy.respond(&result, report);
        self.telemetry
            .log_run(&completed, RunLog::from(&result))
            .await;
        tracing::info!(key = %completed.key, exit = %result.exit, "Run finished");

        drop(workspace);
        Ok(response)
    }

    /// Resolves the result strategy, fetching the fixture it needs before
    /// anything is written to disk.
    async fn plan(&self, request: &RunRequest) -> Result<Strategy, RunError> {
        match request.runner {
            RunnerKind::Simple => Ok(Strategy::Simple),
            RunnerKind::UnitTest => {
                self.tests_reference(request)?;
                Ok(Strategy::UnitTest)
            }
            RunnerKind::OutputDiff => {
                let reference = self.tests_reference(request)?;
                let expected = self.fixtures.fetch(reference).await?;
                Ok(Strategy::OutputDiff { expected })
            }
        }
    }

    async fn prepare(&self, request: &RunRequest) -> Result<Workspace, RunError> {
        match request.runner {
            RunnerKind::UnitTest => {
                let test_source = self.fixtures.fetch(self.tests_reference(request)?).await?;
                let workspace = self
                    .workspaces
                    .prepare_at(&request.code, Path::new(JAVA_MAIN_DIR).join(JAVA_MAIN_FILE))
                    .await?;
                workspace
                    .write_file(Path::new(JAVA_TEST_DIR).join(JAVA_TEST_FILE), &test_source)
                    .await?;
                Ok(workspace)
            }
            _ => {
                self.workspaces
                    .prepare(&request.code, &request.language)
                    .await
            }
        }
    }

    fn tests_reference<'a>(&self, request: &'a RunRequest) -> Result<&'a str, RunError> {
        request
            .tests
            .as_deref()
            .filter(|tests| !tests.is_empty())
            .ok_or(RunError::MissingTestsFlag)
    }
}
