// Job queue and identity acquisition via external commands (squeue, getent)

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::instrument;

use crate::error::ScrapeError;
use crate::identity::{self, ORIGIN_GROUPS, ORIGIN_JOBS, ORIGIN_USERS};
use crate::models::{GroupMap, JobRecord, UserMap};

/// squeue output format: job id, account, user.
const SQUEUE_FORMAT: &str = "%A %a %u";

#[derive(Debug, Clone)]
pub struct CommandRepo {
    squeue: String,
    getent: String,
    timeout: Duration,
}

impl CommandRepo {
    pub fn new(squeue: impl Into<String>, getent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            squeue: squeue.into(),
            getent: getent.into(),
            timeout,
        }
    }

    #[instrument(skip(self), fields(repo = "command", operation = "running_jobs"))]
    pub async fn running_jobs(&self) -> Result<Vec<JobRecord>, ScrapeError> {
        let out = run_command(
            ORIGIN_JOBS,
            &self.squeue,
            &["-ah", "-o", SQUEUE_FORMAT],
            self.timeout,
        )
        .await?;
        identity::parse_jobs(&out)
    }

    #[instrument(skip(self), fields(repo = "command", operation = "users"))]
    pub async fn users(&self) -> Result<UserMap, ScrapeError> {
        let out = run_command(ORIGIN_USERS, &self.getent, &["passwd"], self.timeout).await?;
        identity::parse_users(&out)
    }

    #[instrument(skip(self), fields(repo = "command", operation = "groups"))]
    pub async fn groups(&self) -> Result<GroupMap, ScrapeError> {
        let out = run_command(ORIGIN_GROUPS, &self.getent, &["group"], self.timeout).await?;
        identity::parse_groups(&out)
    }
}

/// Run `program args..` and return its stdout. The child is killed when the
/// timeout elapses.
pub async fn run_command(
    origin: &'static str,
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, ScrapeError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ScrapeError::Acquisition {
            origin,
            reason: format!("failed to spawn {}: {}", program, e),
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| ScrapeError::Acquisition {
            origin,
            reason: format!("{}: {}", program, e),
        })?,
        Err(_) => {
            return Err(ScrapeError::CommandTimeout {
                origin,
                after: timeout,
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScrapeError::Acquisition {
            origin,
            reason: format!("{} exited with {}: {}", program, output.status, stderr.trim()),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| ScrapeError::Acquisition {
        origin,
        reason: format!("{} produced non UTF-8 output: {}", program, e),
    })
}
