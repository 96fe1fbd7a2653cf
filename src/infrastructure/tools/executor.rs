//! # Execution Dispatcher
//!
//! Runs one validated command as exactly one subprocess, with the caller's isolated
//! directory as its working directory. The direct route executes a whitespace-split argv;
//! the interpreted route hands the untouched string to `sh -c` so chained steps share a
//! single shell. A non-zero exit is reported in the result, never swallowed.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::domain::config::ExecutionConfig;
use crate::domain::errors::DispatchError;
use crate::domain::types::{CandidateCommand, ExecutionResult, ExecutionRoute};
use crate::infrastructure::tools::process_group;

/// A working directory that passed `ExecutionDispatcher::validate_workdir`: canonical,
/// an existing directory, inside the allowed roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workdir(PathBuf);

impl Workdir {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionDispatcher {
    shell: String,
    /// Canonicalized at construction; roots that cannot be resolved are dropped.
    allowed_roots: Vec<PathBuf>,
    inherit_env: bool,
}

impl ExecutionDispatcher {
    pub fn new(config: &ExecutionConfig) -> Self {
        let allowed_roots = config
            .allowed_roots
            .iter()
            .filter_map(|root| match root.canonicalize() {
                Ok(canon) => Some(canon),
                Err(e) => {
                    warn!("Ignoring allowed root {:?}: {}", root, e);
                    None
                }
            })
            .collect();

        Self {
            shell: config.shell.clone(),
            allowed_roots,
            inherit_env: config.inherit_env,
        }
    }

    /// Resolves the working directory and checks it is a directory inside the allowed roots.
    pub fn validate_workdir(&self, path: &Path) -> Result<Workdir, DispatchError> {
        let invalid = |reason: String| DispatchError::InvalidWorkdir {
            path: path.to_path_buf(),
            reason,
        };

        let canon = path.canonicalize().map_err(|e| invalid(e.to_string()))?;
        if !canon.is_dir() {
            return Err(invalid("not a directory".to_string()));
        }
        if !self.allowed_roots.is_empty()
            && !self.allowed_roots.iter().any(|root| canon.starts_with(root))
        {
            return Err(invalid("outside the allowed roots".to_string()));
        }
        Ok(Workdir(canon))
    }

    /// Program and arguments for the chosen route.
    pub fn argv(
        &self,
        command: &CandidateCommand,
        route: ExecutionRoute,
    ) -> Result<(String, Vec<String>), DispatchError> {
        match route {
            ExecutionRoute::Direct => {
                let mut parts = command.as_str().split_whitespace().map(str::to_string);
                let program = parts.next().ok_or(DispatchError::EmptyArgv)?;
                Ok((program, parts.collect()))
            }
            ExecutionRoute::Interpreted => Ok((
                self.shell.clone(),
                vec!["-c".to_string(), command.as_str().to_string()],
            )),
        }
    }

    /// Blocks until the subprocess exits and its output is drained, or until `timeout`
    /// elapses. Either way nothing from its process group is left running on return.
    pub async fn dispatch(
        &self,
        command: &CandidateCommand,
        route: ExecutionRoute,
        workdir: &Workdir,
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult, DispatchError> {
        let (program, args) = self.argv(command, route)?;
        let dir = workdir.path();

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if !self.inherit_env {
            cmd.env_clear();
            if let Some(path) = std::env::var_os("PATH") {
                cmd.env("PATH", path);
            }
            cmd.env("HOME", dir).env("TMPDIR", dir);
        }

        #[cfg(unix)]
        cmd.process_group(0);

        info!(%route, workdir = %dir.display(), "Dispatching: {}", command);
        let started = Instant::now();

        let mut child = cmd.spawn().map_err(|source| DispatchError::Spawn {
            program: program.clone(),
            source,
        })?;
        let pgid = child.id();

        let mut stdout_task = tokio::spawn(read_pipe(child.stdout.take()));
        let mut stderr_task = tokio::spawn(read_pipe(child.stderr.take()));

        let completion = async {
            let status = child.wait().await;
            // Background members of the group would keep writing to the workdir and
            // hold the pipes open past the leader.
            if let Some(pgid) = pgid {
                kill_group(pgid);
            }
            let stdout = (&mut stdout_task).await.unwrap_or_default();
            let stderr = (&mut stderr_task).await.unwrap_or_default();
            (status, stdout, stderr)
        };

        let completed = match timeout {
            Some(limit) => tokio::time::timeout(limit, completion).await.ok(),
            None => Some(completion.await),
        };

        let Some((waited, stdout, stderr)) = completed else {
            let limit = timeout.unwrap_or_default();
            warn!(
                "Command exceeded {}s, killing its process group: {}",
                limit.as_secs(),
                command
            );
            terminate(&mut child, pgid).await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(DispatchError::Timeout { after: limit });
        };

        let status = waited.map_err(|source| DispatchError::Wait {
            program: program.clone(),
            source,
        })?;

        let result = ExecutionResult {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            exit_code = ?result.exit_code,
            duration_ms = result.duration_ms,
            "Command finished"
        );
        Ok(result)
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!("Error reading child output: {}", e);
        }
    }
    buf
}

fn kill_group(pgid: u32) {
    if let Err(e) = process_group::kill_process_group(pgid) {
        warn!("Failed to kill process group {}: {}", pgid, e);
    }
}

async fn terminate(child: &mut Child, pgid: Option<u32>) {
    if let Some(pgid) = pgid {
        kill_group(pgid);
    }
    // Reaps the leader; also covers platforms without process groups.
    if let Err(e) = child.kill().await {
        debug!("Child already gone after group kill: {}", e);
    }
}
