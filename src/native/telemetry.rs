use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::Serialize;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

use crate::core::{
    domain::{RunKey, TelemetryEntry},
    errors::TelemetryWriteError,
    traits::telemetry::TelemetryStore,
};

/// Keeps every entry in memory, append-only per run key.
#[derive(Debug, Default)]
pub struct MemoryTelemetryStore {
    entries: DashMap<RunKey, Vec<TelemetryEntry>>,
}

impl MemoryTelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, key: &RunKey) -> Vec<TelemetryEntry> {
        self.entries
            .get(key)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<RunKey> {
        self.entries.iter().map(|entry| *entry.key()).collect()
    }
}

#[async_trait::async_trait]
impl TelemetryStore for MemoryTelemetryStore {
    async fn put(&self, key: &RunKey, entry: &TelemetryEntry) -> Result<(), TelemetryWriteError> {
        self.entries.entry(*key).or_default().push(entry.clone());
        Ok(())
    }
}

/// Appends one JSON object per entry to a file.
#[derive(Debug)]
pub struct JsonLinesTelemetryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

#[derive(Serialize)]
struct Line<'a> {
    key: &'a RunKey,
    #[serde(flatten)]
    entry: &'a TelemetryEntry,
}

impl JsonLinesTelemetryStore {
    pub fn new<T: AsRef<Path>>(path: T) -> Self {
        Self {
            path: path.as_ref().into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait::async_trait]
impl TelemetryStore for JsonLinesTelemetryStore {
    async fn put(&self, key: &RunKey, entry: &TelemetryEntry) -> Result<(), TelemetryWriteError> {
        let mut line = serde_json::to_vec(&Line { key, entry })?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
