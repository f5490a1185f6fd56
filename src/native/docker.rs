use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    constants::{CONTAINER_PREFIX, MOUNT_POINT},
    core::{
        domain::{RunConfig, RunResult},
        errors::LaunchError,
        pipeline::drain::{PipeStatus, drain},
        traits::launcher::Launcher,
    },
};

/// How long output drains may keep running after a timed out container was
/// removed.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Runs `<binary> run --rm --name <name> -v <workspace>:/run <image>` and
/// captures both output streams.
#[derive(Clone, Debug)]
pub struct DockerLauncher {
    binary: PathBuf,
    echo: bool,
    timeout: Option<Duration>,
}

impl DockerLauncher {
    pub fn new<T: AsRef<Path>>(binary: T) -> Self {
        DockerLauncher {
            binary: binary.as_ref().into(),
            echo: false,
            timeout: None,
        }
    }

    /// Mirror the container's output on this process's stdout/stderr.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Kill the container if it has not exited after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, config: &RunConfig, name: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("run")
            .arg("--rm")
            .arg("--name")
            .arg(name)
            .arg("-v")
            .arg(format!("{}:{}", config.workspace.display(), MOUNT_POINT))
            .arg(&config.image)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait::async_trait]
impl Launcher for DockerLauncher {
    #[tracing::instrument(skip(self, config), fields(image = %config.image, workspace = %config.workspace.display()))]
    async fn run(&self, config: &RunConfig) -> Result<RunResult, LaunchError> {
        let started_at = Utc::now();
        let name = format!("{}{}", CONTAINER_PREFIX, Uuid::new_v4());
        let mut process = ContainerProcess::start(self.command(config, &name), &self.binary, name)?;
        let stdout = process.stdout()?;
        let stderr = process.stderr()?;

        let (stdout_task, stderr_task) = if self.echo {
            (
                spawn_drain(stdout, Some(tokio::io::stdout())),
                spawn_drain(stderr, Some(tokio::io::stderr())),
            )
        } else {
            (
                spawn_drain(stdout, None::<tokio::io::Stdout>),
                spawn_drain(stderr, None::<tokio::io::Stderr>),
            )
        };
        let aborts = [stdout_task.abort_handle(), stderr_task.abort_handle()];
        let drains = futures::future::join(
            collect(stdout_task, "stdout"),
            collect(stderr_task, "stderr"),
        );

        // Drains are spawned, so waiting first cannot stall on a full pipe.
        let exit = process.wait(self.timeout).await;
        let (stdout, stderr) = if exit.timed_out {
            match tokio::time::timeout(DRAIN_GRACE, drains).await {
                Ok(output) => output,
                Err(_) => {
                    tracing::warn!("Output still open after container removal, dropping it");
                    aborts.iter().for_each(|abort| abort.abort());
                    (String::new(), String::new())
                }
            }
        } else {
            drains.await
        };
        let ended_at = Utc::now();

        tracing::debug!(exit = %exit.description, "Container finished");

        Ok(RunResult {
            config: config.clone(),
            stdout,
            stderr,
            usage: Default::default(),
            prepare_log: String::new(),
            started_at,
            ended_at,
            exit: exit.description,
        })
    }
}

/// The running container runtime process. Only exposes what a run needs.
#[derive(Debug)]
struct ContainerProcess {
    child: Child,
    binary: PathBuf,
    name: String,
}

#[derive(Debug)]
struct Exit {
    /// Empty on success.
    description: String,
    timed_out: bool,
}

impl ContainerProcess {
    fn start(mut command: Command, binary: &Path, name: String) -> Result<Self, LaunchError> {
        let child = command.spawn().map_err(|source| LaunchError::Spawn {
            binary: binary.display().to_string(),
            source,
        })?;
        Ok(Self {
            child,
            binary: binary.into(),
            name,
        })
    }

    fn stdout(&mut self) -> Result<ChildStdout, LaunchError> {
        self.child
            .stdout
            .take()
            .ok_or(LaunchError::MissingStream { stream: "stdout" })
    }

    fn stderr(&mut self) -> Result<ChildStderr, LaunchError> {
        self.child
            .stderr
            .take()
            .ok_or(LaunchError::MissingStream { stream: "stderr" })
    }

    async fn wait(&mut self, timeout: Option<Duration>) -> Exit {
        let Some(limit) = timeout else {
            return Exit {
                description: describe(self.child.wait().await),
                timed_out: false,
            };
        };

        match tokio::time::timeout(limit, self.child.wait()).await {
            Ok(status) => Exit {
                description: describe(status),
                timed_out: false,
            },
            Err(_) => {
                tracing::warn!(?limit, container = %self.name, "Container exceeded its deadline, removing it");
                self.remove().await;
                if let Err(e) = self.child.kill().await {
                    tracing::error!(error = %e, "Failed to kill container process");
                }
                Exit {
                    description: format!("timed out after {}ms", limit.as_millis()),
                    timed_out: true,
                }
            }
        }
    }

    /// The container outlives a killed runtime client.
    async fn remove(&self) {
        let status = Command::new(&self.binary)
            .arg("rm")
            .arg("-f")
            .arg(&self.name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => {
                tracing::error!(container = %self.name, %status, "Failed to remove container")
            }
            Err(e) => {
                tracing::error!(container = %self.name, error = %e, "Failed to remove container")
            }
        }
    }
}

fn describe(status: std::io::Result<ExitStatus>) -> String {
    match status {
        Ok(status) if status.success() => String::new(),
        Ok(status) => status.to_string(),
        Err(e) => format!("wait failed: {}", e),
    }
}

fn spawn_drain<R, E>(source: R, echo: Option<E>) -> JoinHandle<(PipeStatus, Vec<u8>)>
where
    R: AsyncRead + Unpin + Send + 'static,
    E: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        let status = drain(source, echo, &mut buffer).await;
        (status, buffer)
    })
}

async fn collect(task: JoinHandle<(PipeStatus, Vec<u8>)>, stream: &'static str) -> String {
    match task.await {
        Ok((status, buffer)) => {
            if !status.is_clean() {
                tracing::warn!(
                    stream,
                    read = status.read,
                    buffered = status.buffered,
                    read_error = ?status.read_error,
                    write_error = ?status.write_error,
                    buffer_error = ?status.buffer_error,
                    "Output drain reported errors"
                );
            }
            String::from_utf8_lossy(&buffer).into_owned()
        }
        Err(e) => {
            tracing::error!(stream, error = %e, "Output drain task failed");
            String::new()
        }
    }
}
