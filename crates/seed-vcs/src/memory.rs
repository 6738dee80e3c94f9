//! In-process remote repository.
//!
//! [`MemoryRemote`] holds branch snapshots. [`MemoryWorkingCopy`] clones it
//! into a real directory and implements [`VersionControl`];
//! [`MemoryRemote::host`] exposes the same branches as a [`ContentHost`].
//! Any operation can be made to fail for testing error paths.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use seed_core::{Error, RemoteError, Result};
use walkdir::WalkDir;

use crate::host::{ContentHost, RemoteFile};
use crate::vcs::VersionControl;

/// Repository-relative path to file bytes.
pub type Snapshot = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsOp {
    Clone,
    Checkout,
    Pull,
    Commit,
    Push,
    LsRemote,
    GetFile,
    PutFile,
}

#[derive(Default)]
struct RemoteState {
    branches: BTreeMap<String, Snapshot>,
    failures: HashMap<VcsOp, RemoteError>,
    put_budget: Option<usize>,
    log: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<RemoteState>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote with an empty `branch`.
    pub fn with_branch(branch: &str) -> Self {
        let remote = Self::new();
        lock(&remote.state)
            .branches
            .insert(branch.to_string(), Snapshot::new());
        remote
    }

    /// Write a file straight onto a remote branch, creating the branch.
    pub fn seed_file(&self, branch: &str, path: &str, content: impl Into<Vec<u8>>) {
        lock(&self.state)
            .branches
            .entry(branch.to_string())
            .or_default()
            .insert(path.to_string(), content.into());
    }

    pub fn file(&self, branch: &str, path: &str) -> Option<Vec<u8>> {
        lock(&self.state)
            .branches
            .get(branch)
            .and_then(|files| files.get(path).cloned())
    }

    pub fn file_string(&self, branch: &str, path: &str) -> Option<String> {
        self.file(branch, path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        lock(&self.state).branches.contains_key(branch)
    }

    pub fn branch_files(&self, branch: &str) -> Vec<String> {
        lock(&self.state)
            .branches
            .get(branch)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Make every subsequent `op` fail until [`heal`](Self::heal) is called.
    pub fn fail(&self, op: VcsOp) {
        self.fail_with(
            op,
            RemoteError::Command {
                op: format!("{:?}", op),
                stderr: "injected failure".to_string(),
            },
        );
    }

    pub fn fail_with(&self, op: VcsOp, err: RemoteError) {
        lock(&self.state).failures.insert(op, err);
    }

    pub fn heal(&self, op: VcsOp) {
        lock(&self.state).failures.remove(&op);
    }

    /// Allow `n` more successful file uploads, then reject the rest.
    pub fn fail_puts_after(&self, n: usize) {
        lock(&self.state).put_budget = Some(n);
    }

    /// Operations performed so far, e.g. `"push main"`.
    pub fn log(&self) -> Vec<String> {
        lock(&self.state).log.clone()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        lock(&self.state)
            .log
            .iter()
            .filter(|entry| entry.starts_with("commit "))
            .filter_map(|entry| entry.split_once(": ").map(|(_, msg)| msg.to_string()))
            .collect()
    }

    pub fn working_copy(&self, workdir: impl Into<PathBuf>) -> MemoryWorkingCopy {
        MemoryWorkingCopy {
            remote: self.clone(),
            workdir: workdir.into(),
            local: Mutex::new(LocalState::default()),
        }
    }

    pub fn host(&self) -> MemoryHost {
        MemoryHost {
            remote: self.clone(),
        }
    }

    fn check(&self, op: VcsOp) -> Result<()> {
        match lock(&self.state).failures.get(&op) {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }

    fn record(&self, entry: String) {
        lock(&self.state).log.push(entry);
    }
}

#[derive(Default)]
struct LocalState {
    branches: BTreeMap<String, Snapshot>,
    current: Option<String>,
    staged: Option<Snapshot>,
}

/// Working copy of a [`MemoryRemote`] in a real directory.
pub struct MemoryWorkingCopy {
    remote: MemoryRemote,
    workdir: PathBuf,
    local: Mutex<LocalState>,
}

fn command_error(op: &str, stderr: &str) -> Error {
    RemoteError::Command {
        op: op.to_string(),
        stderr: stderr.to_string(),
    }
    .into()
}

#[async_trait]
impl VersionControl for MemoryWorkingCopy {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    async fn clone_fresh(&self) -> Result<()> {
        self.remote.check(VcsOp::Clone)?;

        let branches = lock(&self.remote.state).branches.clone();
        let mut local = lock(&self.local);
        *local = LocalState::default();
        write_tree(&self.workdir, &Snapshot::new())?;
        local.branches = branches;
        self.remote.record("clone".to_string());
        Ok(())
    }

    async fn checkout(&self, branch: &str) -> Result<()> {
        self.remote.check(VcsOp::Checkout)?;

        let mut local = lock(&self.local);
        let Some(snapshot) = local.branches.get(branch) else {
            return Err(command_error(
                &format!("git checkout {}", branch),
                &format!("pathspec '{}' did not match any file(s) known to git", branch),
            ));
        };
        write_tree(&self.workdir, snapshot)?;
        local.current = Some(branch.to_string());
        local.staged = None;
        Ok(())
    }

    async fn checkout_orphan(&self, branch: &str) -> Result<()> {
        self.remote.check(VcsOp::Checkout)?;

        let mut local = lock(&self.local);
        write_tree(&self.workdir, &Snapshot::new())?;
        local.branches.remove(branch);
        local.current = Some(branch.to_string());
        local.staged = None;
        Ok(())
    }

    async fn pull(&self, branch: &str) -> Result<()> {
        self.remote.check(VcsOp::Pull)?;

        let Some(snapshot) = lock(&self.remote.state).branches.get(branch).cloned() else {
            return Err(command_error(
                &format!("git pull origin {}", branch),
                &format!("couldn't find remote ref {}", branch),
            ));
        };

        let mut local = lock(&self.local);
        if local.current.as_deref() == Some(branch) {
            write_tree(&self.workdir, &snapshot)?;
        }
        local.branches.insert(branch.to_string(), snapshot);
        Ok(())
    }

    async fn add_all(&self) -> Result<()> {
        let snapshot = read_tree(&self.workdir)?;
        lock(&self.local).staged = Some(snapshot);
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<bool> {
        self.remote.check(VcsOp::Commit)?;

        let mut local = lock(&self.local);
        let Some(branch) = local.current.clone() else {
            return Err(command_error("git commit", "not on any branch"));
        };
        let Some(staged) = local.staged.take() else {
            return Ok(false);
        };

        let unchanged = match local.branches.get(&branch) {
            Some(head) => *head == staged,
            None => staged.is_empty(),
        };
        if unchanged {
            return Ok(false);
        }

        local.branches.insert(branch.clone(), staged);
        self.remote.record(format!("commit {}: {}", branch, message));
        Ok(true)
    }

    async fn push(&self, branch: &str) -> Result<()> {
        self.remote.check(VcsOp::Push)?;

        let Some(snapshot) = lock(&self.local).branches.get(branch).cloned() else {
            return Err(command_error(
                &format!("git push origin {}", branch),
                &format!("src refspec {} does not match any", branch),
            ));
        };
        lock(&self.remote.state)
            .branches
            .insert(branch.to_string(), snapshot);
        self.remote.record(format!("push {}", branch));
        Ok(())
    }

    async fn remote_branch_exists(&self, branch: &str) -> Result<bool> {
        self.remote.check(VcsOp::LsRemote)?;
        Ok(self.remote.has_branch(branch))
    }
}

/// [`ContentHost`] view of a [`MemoryRemote`]. Versions are BLAKE3 digests.
#[derive(Clone)]
pub struct MemoryHost {
    remote: MemoryRemote,
}

pub fn content_sha(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

#[async_trait]
impl ContentHost for MemoryHost {
    async fn get_file(&self, path: &str, branch: &str) -> Result<Option<RemoteFile>> {
        self.remote.check(VcsOp::GetFile)?;

        Ok(self.remote.file(branch, path).map(|content| RemoteFile {
            sha: content_sha(&content),
            content,
        }))
    }

    async fn put_file(
        &self,
        path: &str,
        branch: &str,
        content: &[u8],
        message: &str,
        prior_sha: Option<&str>,
    ) -> Result<String> {
        self.remote.check(VcsOp::PutFile)?;

        let mut state = lock(&self.remote.state);
        if let Some(budget) = state.put_budget.as_mut() {
            if *budget == 0 {
                return Err(RemoteError::Http {
                    url: format!("memory://{}/{}", branch, path),
                    status: 502,
                    body: "upload budget exhausted".to_string(),
                }
                .into());
            }
            *budget -= 1;
        }

        let Some(files) = state.branches.get_mut(branch) else {
            return Err(RemoteError::Http {
                url: format!("memory://{}/{}", branch, path),
                status: 404,
                body: format!("Branch {} not found", branch),
            }
            .into());
        };

        let current = files.get(path).map(|c| content_sha(c));
        if current.as_deref() != prior_sha {
            return Err(RemoteError::Conflict {
                path: path.to_string(),
                detail: format!("expected {:?}, found {:?}", prior_sha, current),
            }
            .into());
        }

        files.insert(path.to_string(), content.to_vec());
        state.log.push(format!("put {}/{}: {}", branch, path, message));
        Ok(content_sha(content))
    }
}

fn read_tree(root: &Path) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    if !root.exists() {
        return Ok(snapshot);
    }

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::Other(e.into()))?;
        let key = relative.to_string_lossy().replace('\\', "/");
        snapshot.insert(key, std::fs::read(entry.path())?);
    }

    Ok(snapshot)
}

fn write_tree(root: &Path, snapshot: &Snapshot) -> Result<()> {
    if root.exists() {
        std::fs::remove_dir_all(root)?;
    }
    std::fs::create_dir_all(root)?;

    for (path, content) in snapshot {
        let target = root.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, content)?;
    }

    Ok(())
}
