use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::RunError;

/// Maps a language identifier to the file name its image expects the source under.
#[derive(Clone, Debug)]
pub struct LanguageTable {
    files: HashMap<String, String>,
}

impl LanguageTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            files: entries
                .into_iter()
                .map(|(lang, file)| (lang.into(), file.into()))
                .collect(),
        }
    }

    pub fn file_name(&self, language: &str) -> Result<&str, RunError> {
        self.files
            .get(language)
            .map(String::as_str)
            .ok_or_else(|| RunError::UnsupportedLanguage {
                language: language.to_string(),
            })
    }

    /// Resolves the container image for `language`. There is no other
    /// resolution mechanism than prefix + language code.
    pub fn image(&self, language: &str, prefix: &str) -> Result<String, RunError> {
        self.file_name(language)?;
        Ok(format!("{}{}", prefix, language))
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new([
            ("py", "app.py"),
            ("c", "app.c"),
            ("cpp", "app.cpp"),
            ("java", "Application.java"),
        ])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerKind {
    Simple,
    UnitTest,
    OutputDiff,
}

impl RunnerKind {
    pub fn parse(name: &str) -> Result<Self, RunError> {
        match name {
            "simple" => Ok(RunnerKind::Simple),
            "javaut" => Ok(RunnerKind::UnitTest),
            "outputtest" => Ok(RunnerKind::OutputDiff),
            other => Err(RunError::UnknownRunner {
                runner: other.to_string(),
            }),
        }
    }
}

/// A validated run request as it enters the orchestrator.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub code: String,
    pub language: String,
    pub runner: RunnerKind,
    /// Reference to a test fixture (expected output or unit test source).
    pub tests: Option<String>,
    pub challenge: Option<String>,
    pub user: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub image: String,
    pub workspace: PathBuf,
    pub code: String,
    pub language: String,
    pub challenge: Option<String>,
    pub user: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RunResult {
    pub config: RunConfig,
    pub stdout: String,
    pub stderr: String,
    pub usage: ResourceUsage,
    pub prepare_log: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Empty when the container exited successfully.
    pub exit: String,
}

impl RunResult {
    pub fn runtime_error(&self) -> Option<&str> {
        (!self.exit.is_empty()).then_some(self.exit.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeval {
    #[serde(rename = "Sec", default)]
    pub sec: i64,
    #[serde(rename = "Usec", default)]
    pub usec: i64,
}

/// Resource counters written by the container into `stats.log`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceUsage {
    #[serde(rename = "Utime")]
    pub user_time: Timeval,
    #[serde(rename = "Stime")]
    pub system_time: Timeval,
    #[serde(rename = "Maxrss")]
    pub max_rss: i64,
    #[serde(rename = "Ixrss")]
    pub shared_rss: i64,
    #[serde(rename = "Idrss")]
    pub unshared_data: i64,
    #[serde(rename = "Isrss")]
    pub unshared_stack: i64,
    #[serde(rename = "Minflt")]
    pub minor_faults: i64,
    #[serde(rename = "Majflt")]
    pub major_faults: i64,
    #[serde(rename = "Nswap")]
    pub swaps: i64,
    #[serde(rename = "Inblock")]
    pub block_reads: i64,
    #[serde(rename = "Oublock")]
    pub block_writes: i64,
    #[serde(rename = "Msgsnd")]
    pub messages_sent: i64,
    #[serde(rename = "Msgrcv")]
    pub messages_received: i64,
    #[serde(rename = "Nsignals")]
    pub signals: i64,
    #[serde(rename = "Nvcsw")]
    pub voluntary_switches: i64,
    #[serde(rename = "Nivcsw")]
    pub involuntary_switches: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitTestResult {
    pub tests: u32,
    pub failures: u32,
    pub errors: u32,
    pub test_cases: Vec<TestCaseResult>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TestCaseResult {
    pub name: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunKey(pub Uuid);

impl RunKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Started,
    Good,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub challenge: String,
    pub user: String,
    pub code: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Captured output of a finished run, stored next to its telemetry record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLog {
    pub stdout: String,
    pub stderr: String,
    pub prepare_log: String,
    pub usage: ResourceUsage,
}

impl From<&RunResult> for RunLog {
    fn from(result: &RunResult) -> Self {
        Self {
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
            prepare_log: result.prepare_log.clone(),
            usage: result.usage.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TelemetryEntry {
    Build(TelemetryRecord),
    Log(RunLog),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_resolves_images() {
        let table = LanguageTable::default();

        assert_eq!(table.file_name("py").unwrap(), "app.py");
        assert_eq!(table.file_name("java").unwrap(), "Application.java");
        assert_eq!(
            table.image("cpp", "coduno/fingerprint-").unwrap(),
            "coduno/fingerprint-cpp"
        );
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        let table = LanguageTable::default();

        assert!(matches!(
            table.image("brainfuck", "coduno/fingerprint-"),
            Err(RunError::UnsupportedLanguage { language }) if language == "brainfuck"
        ));
    }

    #[test]
    fn test_runner_names() {
        assert_eq!(RunnerKind::parse("simple").unwrap(), RunnerKind::Simple);
        assert_eq!(RunnerKind::parse("javaut").unwrap(), RunnerKind::UnitTest);
        assert_eq!(
            RunnerKind::parse("outputtest").unwrap(),
            RunnerKind::OutputDiff
        );
        assert!(matches!(
            RunnerKind::parse("fuzz"),
            Err(RunError::UnknownRunner { .. })
        ));
    }

    #[test]
    fn test_resource_usage_reads_partial_json() {
        let usage: ResourceUsage =
            serde_json::from_str(r#"{"Utime":{"Sec":1,"Usec":250},"Maxrss":2048,"Nvcsw":7}"#)
                .unwrap();

        assert_eq!(usage.user_time, Timeval { sec: 1, usec: 250 });
        assert_eq!(usage.max_rss, 2048);
        assert_eq!(usage.voluntary_switches, 7);
        assert_eq!(usage.swaps, 0);
    }
}
