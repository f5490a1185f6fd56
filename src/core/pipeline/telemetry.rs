use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::{
    domain::{RunKey, RunLog, RunStatus, TelemetryEntry, TelemetryRecord},
    traits::telemetry::TelemetryStore,
};

/// Best-effort lifecycle records for runs. Store failures are logged and
/// swallowed; they never fail a run.
#[derive(Clone, Debug)]
pub struct TelemetryLogger {
    store: Arc<dyn TelemetryStore>,
}

/// A run whose start record has been issued. Consumed by
/// [`TelemetryLogger::log_complete`], so a run completes at most once.
#[derive(Debug)]
#[must_use]
pub struct StartedRun {
    pub key: RunKey,
    pub record: TelemetryRecord,
}

#[derive(Debug)]
pub struct CompletedRun {
    pub key: RunKey,
    pub record: TelemetryRecord,
}

impl TelemetryLogger {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, code))]
    pub async fn log_start(&self, challenge: &str, code: &str, user: &str) -> StartedRun {
        let key = RunKey::new();
        let record = TelemetryRecord {
            challenge: challenge.to_string(),
            user: user.to_string(),
            code: code.to_string(),
            status: RunStatus::Started,
            started_at: Utc::now(),
            ended_at: DateTime::<Utc>::UNIX_EPOCH,
        };

        self.put(&key, TelemetryEntry::Build(record.clone())).await;
        StartedRun { key, record }
    }

    #[tracing::instrument(skip(self, run), fields(key = %run.key))]
    pub async fn log_complete(&self, run: StartedRun, runtime_error: Option<&str>) -> CompletedRun {
        let StartedRun { key, mut record } = run;
        record.ended_at = Utc::now();
        record.status = match runtime_error {
            Some(_) => RunStatus::Failed,
            None => RunStatus::Good,
        };

        self.put(&key, TelemetryEntry::Build(record.clone())).await;
        CompletedRun { key, record }
    }

    pub async fn log_run(&self, run: &CompletedRun, log: RunLog) {
        self.put(&run.key, TelemetryEntry::Log(log)).await;
    }

    async fn put(&self, key: &RunKey, entry: TelemetryEntry) {
        if let Err(e) = self.store.put(key, &entry).await {
            tracing::error!(%key, error = %e, "Telemetry write failed");
        }
    }
}
