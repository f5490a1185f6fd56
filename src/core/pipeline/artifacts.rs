use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::fs;

use crate::{
    constants::{PREPARE_LOG, STATS_LOG, TEST_REPORT},
    core::{
        domain::{ResourceUsage, TestCaseResult, UnitTestResult},
        errors::ArtifactReadError,
    },
};

/// Reads the preparation log and resource usage the container left in the
/// workspace. Missing or broken files yield empty values.
pub async fn read_artifacts(workspace: &Path) -> (String, ResourceUsage) {
    let prepare_log = read_prepare_log(workspace).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Preparation log unavailable");
        String::new()
    });
    let usage = read_usage(workspace).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Resource usage unavailable");
        ResourceUsage::default()
    });

    (prepare_log, usage)
}

/// Reads the JUnit report written by test runner images. A missing report is
/// a zero-valued result.
pub async fn read_test_report(workspace: &Path) -> UnitTestResult {
    let path = workspace.join(TEST_REPORT);
    let parsed = match read(&path).await {
        Ok(xml) => parse_test_report(&path, &xml),
        Err(e) => Err(e),
    };

    parsed.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Test report unavailable");
        UnitTestResult::default()
    })
}

async fn read_prepare_log(workspace: &Path) -> Result<String, ArtifactReadError> {
    let path = workspace.join(PREPARE_LOG);
    let bytes = fs::read(&path)
        .await
        .map_err(|source| ArtifactReadError::Io { path, source })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn read_usage(workspace: &Path) -> Result<ResourceUsage, ArtifactReadError> {
    let path = workspace.join(STATS_LOG);
    let json = read(&path).await?;
    serde_json::from_str(&json).map_err(|source| ArtifactReadError::Json { path, source })
}

async fn read(path: &Path) -> Result<String, ArtifactReadError> {
    fs::read_to_string(path)
        .await
        .map_err(|source| ArtifactReadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_test_report(path: &Path, xml: &str) -> Result<UnitTestResult, ArtifactReadError> {
    let suite: JUnitSuite =
        quick_xml::de::from_str(xml).map_err(|source| ArtifactReadError::Xml {
            path: PathBuf::from(path),
            source,
        })?;
    Ok(suite.into())
}

#[derive(Debug, Deserialize)]
struct JUnitSuite {
    #[serde(rename = "@tests", default)]
    tests: u32,
    #[serde(rename = "@failures", default)]
    failures: u32,
    #[serde(rename = "@errors", default)]
    errors: u32,
    #[serde(rename = "testcase", default)]
    cases: Vec<JUnitCase>,
}

#[derive(Debug, Deserialize)]
struct JUnitCase {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@time", default)]
    time: String,
    #[serde(default)]
    failure: Option<JUnitFailure>,
}

#[derive(Debug, Deserialize)]
struct JUnitFailure {
    #[serde(rename = "@message", default)]
    message: String,
}

impl From<JUnitSuite> for UnitTestResult {
    fn from(suite: JUnitSuite) -> Self {
        Self {
            tests: suite.tests,
            failures: suite.failures,
            errors: suite.errors,
            test_cases: suite.cases.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<JUnitCase> for TestCaseResult {
    fn from(case: JUnitCase) -> Self {
        Self {
            name: case.name,
            time: case.time,
            failure: case.failure.map(|f| f.message),
        }
    }
}
