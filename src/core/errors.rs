use std::path::PathBuf;

/// Failures that abort a run before or while the container is launched.
/// Everything after launch degrades the response instead of failing it.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Language not available: {language}")]
    UnsupportedLanguage { language: String },

    #[error("Runner not available: {runner}")]
    UnknownRunner { runner: String },

    #[error("There is no test path provided")]
    MissingTestsFlag,

    #[error("File preparation error at {}: {source}", path.display())]
    WorkspacePreparation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl RunError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RunError::UnsupportedLanguage { .. }
                | RunError::UnknownRunner { .. }
                | RunError::MissingTestsFlag
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Failed to start container runtime {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Container {stream} is not piped")]
    MissingStream { stream: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Test fixture {reference} escapes the fixture root")]
    OutsideRoot { reference: String },

    #[error("Failed to read test fixture {reference}: {source}")]
    Read {
        reference: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryWriteError {
    #[error("Telemetry store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Telemetry entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactReadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::DeError,
    },
}
