use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use seed_core::{RemoteError, Result};
use tokio::process::Command;
use tracing::{debug, info};

use crate::vcs::VersionControl;

/// Author identity for commits made by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// [`VersionControl`] backed by the `git` command line.
pub struct GitCli {
    url: String,
    display_url: String,
    token: Option<String>,
    workdir: PathBuf,
    identity: Identity,
    timeout: Duration,
}

impl GitCli {
    pub fn new(
        url: &str,
        token: Option<&str>,
        workdir: impl Into<PathBuf>,
        identity: Identity,
        timeout: Duration,
    ) -> Self {
        let authenticated = match token {
            Some(token) => authenticated_url(url, token),
            None => url.to_string(),
        };

        Self {
            url: authenticated,
            display_url: mask_credentials(url),
            token: token.map(str::to_string),
            workdir: workdir.into(),
            identity,
            timeout,
        }
    }

    /// Run git with `args` in `dir`. `label` is what appears in logs and
    /// errors, so it must not contain credentials.
    async fn run(&self, dir: &Path, args: &[&str], label: &str) -> Result<String> {
        debug!("Running {} in {}", label, dir.display());

        let mut cmd = Command::new("git");
        cmd.current_dir(dir)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());

        let output = output_within(cmd, self.timeout, label).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RemoteError::Command {
                op: label.to_string(),
                stderr: self.scrub(stderr.trim()),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        let label = format!("git {}", args.join(" "));
        self.run(&self.workdir, args, &label).await
    }

    fn scrub(&self, text: &str) -> String {
        match &self.token {
            Some(token) if !token.is_empty() => text.replace(token.as_str(), "***"),
            _ => text.to_string(),
        }
    }
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
async fn output_within(mut cmd: Command, timeout: Duration, label: &str) -> Result<Output> {
    let output = tokio::time::timeout(timeout, cmd.kill_on_drop(true).output())
        .await
        .map_err(|_| RemoteError::Timeout {
            op: label.to_string(),
            after: timeout,
        })?
        .map_err(|e| RemoteError::Command {
            op: label.to_string(),
            stderr: format!("failed to run command: {}", e),
        })?;
    Ok(output)
}

#[async_trait]
impl VersionControl for GitCli {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    async fn clone_fresh(&self) -> Result<()> {
        if self.workdir.exists() {
            tokio::fs::remove_dir_all(&self.workdir).await?;
        }
        if let Some(parent) = self.workdir.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        info!("Cloning {} into {}", self.display_url, self.workdir.display());
        let target = self.workdir.to_string_lossy().into_owned();
        let label = format!("git clone {}", self.display_url);
        self.run(Path::new("."), &["clone", "--quiet", &self.url, &target], &label)
            .await?;

        self.git(&["config", "user.email", &self.identity.email])
            .await?;
        self.git(&["config", "user.name", &self.identity.name]).await?;
        Ok(())
    }

    async fn checkout(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", branch]).await?;
        Ok(())
    }

    async fn checkout_orphan(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", "--orphan", branch]).await?;
        // Fails on an empty index, which is fine.
        if let Err(e) = self.git(&["rm", "-rf", "--quiet", "."]).await {
            debug!("Ignoring failed index cleanup: {}", e);
        }
        Ok(())
    }

    async fn pull(&self, branch: &str) -> Result<()> {
        self.git(&["pull", "--quiet", "--ff-only", "origin", branch])
            .await?;
        Ok(())
    }

    async fn add_all(&self) -> Result<()> {
        self.git(&["add", "--all"]).await?;
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<bool> {
        let status = self.git(&["status", "--porcelain"]).await?;
        if status.trim().is_empty() {
            debug!("Nothing to commit for: {}", message);
            return Ok(false);
        }
        self.git(&["commit", "--quiet", "-m", message]).await?;
        Ok(true)
    }

    async fn push(&self, branch: &str) -> Result<()> {
        info!("Pushing {} to {}", branch, self.display_url);
        self.git(&["push", "--quiet", "-u", "origin", branch]).await?;
        Ok(())
    }

    async fn remote_branch_exists(&self, branch: &str) -> Result<bool> {
        let out = self
            .git(&["ls-remote", "--heads", "origin", branch])
            .await?;
        Ok(!out.trim().is_empty())
    }
}

/// Embed a token in an https remote URL. Other URL forms are returned as is.
pub fn authenticated_url(url: &str, token: &str) -> String {
    match url.strip_prefix("https://") {
        Some(rest) => {
            let host_and_path = rest.rsplit_once('@').map_or(rest, |(_, h)| h);
            format!("https://x-access-token:{}@{}", token, host_and_path)
        }
        None => url.to_string(),
    }
}

/// Replace any userinfo in an https URL with `***`.
pub fn mask_credentials(url: &str) -> String {
    match url.strip_prefix("https://") {
        Some(rest) => match rest.split_once('@') {
            Some((userinfo, host)) if !userinfo.contains('/') => {
                format!("https://***@{}", host)
            }
            _ => url.to_string(),
        },
        None => url.to_string(),
    }
}
