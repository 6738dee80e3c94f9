use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use seed_core::Error;
use tracing::debug;

pub const TOKEN_ENV: &str = "GITHUB_PAT";
pub const REPO_URL_ENV: &str = "CARTON_REPO_URL";
pub const BRANCH_ENV: &str = "CARTON_BRANCH";
pub const PUBLIC_BRANCH_ENV: &str = "SEED_PUBLIC_BRANCH";

/// Configuration for seed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub publish: PublishConfig,

    #[serde(default)]
    pub redaction: RedactionConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    /// Access token. Only ever read from the environment.
    #[serde(skip)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Working copy of the private branch.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_public_branch")]
    pub public_branch: String,

    #[serde(default = "default_public_workdir")]
    pub public_workdir: PathBuf,

    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Mirror of last published sources, used for change detection.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_git_timeout")]
    pub git_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    #[serde(default = "default_rules_file")]
    pub rules_file: PathBuf,

    /// Turn detected secrets into rules before staging.
    #[serde(default = "default_true")]
    pub detect_secrets: bool,

    #[serde(default)]
    pub extra_patterns: Vec<PatternConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_identity_name")]
    pub name: String,

    #[serde(default = "default_identity_email")]
    pub email: String,
}

/// Remote location and token, both required before touching the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub token: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            url: None,
            branch: default_branch(),
            workdir: default_workdir(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            public_branch: default_public_branch(),
            public_workdir: default_public_workdir(),
            staging_dir: default_staging_dir(),
            cache_dir: default_cache_dir(),
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout(),
            git_timeout_secs: default_git_timeout(),
        }
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            rules_file: default_rules_file(),
            detect_secrets: true,
            extra_patterns: Vec::new(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_identity_name(),
            email: default_identity_email(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "seed", "seed")
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".seed"))
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_public_branch() -> String {
    "public".to_string()
}

fn default_workdir() -> PathBuf {
    data_dir().join("private")
}

fn default_public_workdir() -> PathBuf {
    data_dir().join("public")
}

fn default_staging_dir() -> PathBuf {
    data_dir().join("staging")
}

fn default_cache_dir() -> PathBuf {
    data_dir().join("published_cache")
}

fn default_rules_file() -> PathBuf {
    data_dir().join("redacted.json")
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_git_timeout() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_identity_name() -> String {
    "SEED Publishing Bot".to_string()
}

fn default_identity_email() -> String {
    "seed-bot@example.com".to_string()
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing defaults there if it does not exist.
    /// Environment overrides are applied afterwards.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            debug!("Writing default config to {}", path.display());
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            config
        };

        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = project_dirs() {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from(".seed/config.toml")
        }
    }

    /// Apply overrides from `lookup`, normally the process environment.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = lookup(TOKEN_ENV) {
            self.token = Some(token);
        }
        if let Some(url) = lookup(REPO_URL_ENV) {
            self.repository.url = Some(url);
        }
        if let Some(branch) = lookup(BRANCH_ENV) {
            self.repository.branch = branch;
        }
        if let Some(branch) = lookup(PUBLIC_BRANCH_ENV) {
            self.publish.public_branch = branch;
        }
        self
    }

    pub fn credentials(&self) -> seed_core::Result<Credentials> {
        let url = self
            .repository
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "Repository URL not set (repository.url or {})",
                    REPO_URL_ENV
                ))
            })?;
        let token = self
            .token
            .clone()
            .ok_or_else(|| Error::Config(format!("{} environment variable not set", TOKEN_ENV)))?;

        if self.repository.branch == self.publish.public_branch {
            return Err(Error::Config(format!(
                "Public branch must differ from the private branch ({})",
                self.repository.branch
            )));
        }

        Ok(Credentials { url, token })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.publish.request_timeout_secs)
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.publish.git_timeout_secs)
    }

    /// Extra detector patterns as `(type, regex)` pairs.
    pub fn extra_patterns(&self) -> Vec<(String, String)> {
        self.redaction
            .extra_patterns
            .iter()
            .map(|p| (p.name.clone(), p.pattern.clone()))
            .collect()
    }
}
