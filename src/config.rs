use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_IMAGE_PREFIX;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "CODERUNNER_LISTEN", default_value = "0.0.0.0:8081")]
    pub listen: SocketAddr,

    /// Container runtime binary.
    #[arg(long, env = "CODERUNNER_DOCKER", default_value = "docker")]
    pub docker: PathBuf,

    #[arg(long, env = "CODERUNNER_IMAGE_PREFIX", default_value = DEFAULT_IMAGE_PREFIX)]
    pub image_prefix: String,

    /// Where run workspaces are created. Defaults to the system temp dir.
    #[arg(long, env = "CODERUNNER_WORKSPACE_ROOT")]
    pub workspace_root: Option<PathBuf>,

    /// Directory test fixtures are read from.
    #[arg(long, env = "CODERUNNER_FIXTURE_ROOT", default_value = ".")]
    pub fixture_root: PathBuf,

    /// Append telemetry to this JSON-lines file instead of keeping it in memory.
    /// The in-memory default keeps every run's code and output for the life of
    /// the process and grows without bound.
    #[arg(long, env = "CODERUNNER_TELEMETRY_LOG")]
    pub telemetry_log: Option<PathBuf>,

    /// Kill a run after this many seconds.
    #[arg(long, env = "CODERUNNER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Don't mirror container output on our own stdout/stderr.
    #[arg(long, env = "CODERUNNER_NO_ECHO")]
    pub no_echo: bool,

    /// Echo submitted code back instead of starting containers.
    #[arg(long, env = "CODERUNNER_DRY_RUN")]
    pub dry_run: bool,
}

impl Config {
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
