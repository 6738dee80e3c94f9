//! GitHub Contents API client

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode, Url};
use seed_core::{Error, RemoteError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::host::{ContentHost, RemoteFile};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

pub struct GitHubContents {
    http: Client,
    api_base: Url,
    owner: String,
    repo: String,
    token: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GitHubContents {
    pub fn new(repo_url: &str, token: &str, api_base: &str, timeout: Duration) -> Result<Self> {
        let (owner, repo) = parse_repo_slug(repo_url)?;
        let api_base = Url::parse(api_base)
            .map_err(|e| Error::Config(format!("Invalid API base {}: {}", api_base, e)))?;

        let http = Client::builder()
            .user_agent("seed/0.1 (publication pipeline)")
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(anyhow::anyhow!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base,
            owner,
            repo,
            token: token.to_string(),
            timeout,
        })
    }

    fn contents_url(&self, path: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("API base cannot be a base: {}", self.api_base)))?
            .pop_if_empty()
            .extend(["repos", &self.owner, &self.repo, "contents"])
            .extend(path.split('/'));
        Ok(url)
    }

    fn transport_error(&self, op: String, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout {
                op,
                after: self.timeout,
            }
        } else {
            RemoteError::Transport(format!("{}: {}", op, err))
        }
    }
}

#[async_trait]
impl ContentHost for GitHubContents {
    async fn get_file(&self, path: &str, branch: &str) -> Result<Option<RemoteFile>> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", branch);
        debug!("GET {}", url);

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| self.transport_error(format!("GET {}", path), e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            }
            .into());
        }

        let parsed: ContentsResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(format!("GET {}", path), e))?;

        let encoded: String = parsed
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let content = STANDARD.decode(encoded).map_err(|e| {
            RemoteError::Transport(format!("Invalid base64 content for {}: {}", path, e))
        })?;

        Ok(Some(RemoteFile {
            content,
            sha: parsed.sha,
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
        let url = self.contents_url(path)?;
        let body = PutRequest {
            message,
            content: STANDARD.encode(content),
            branch,
            sha: prior_sha,
        };

        let response = self
            .http
            .put(url.clone())
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(format!("PUT {}", path), e))?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            let detail = response.text().await.unwrap_or_default();
            return Err(RemoteError::Conflict {
                path: path.to_string(),
                detail: detail.chars().take(200).collect(),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            }
            .into());
        }

        let parsed: PutResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(format!("PUT {}", path), e))?;

        info!("Uploaded {} to {}", path, branch);
        Ok(parsed.content.sha)
    }
}

/// Extract `(owner, repo)` from an https or scp-style GitHub remote URL.
pub fn parse_repo_slug(url: &str) -> Result<(String, String)> {
    let trimmed = url.trim().trim_end_matches('/');
    let path = if let Some(rest) = trimmed.strip_prefix("git@") {
        rest.split_once(':').map(|(_, p)| p)
    } else if let Some(rest) = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
    {
        let rest = rest.rsplit_once('@').map_or(rest, |(_, r)| r);
        rest.split_once('/').map(|(_, p)| p)
    } else {
        None
    };

    let slug = path
        .map(|p| p.trim_end_matches(".git"))
        .and_then(|p| p.split_once('/'))
        .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'));

    match slug {
        Some((owner, repo)) => Ok((owner.to_string(), repo.to_string())),
        None => Err(Error::Config(format!(
            "Cannot determine owner/repo from repository URL: {}",
            url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_slug() {
        let expected = ("acme".to_string(), "kb".to_string());
        assert_eq!(parse_repo_slug("https://github.com/acme/kb.git").unwrap(), expected);
        assert_eq!(parse_repo_slug("https://github.com/acme/kb").unwrap(), expected);
        assert_eq!(
            parse_repo_slug("https://x-access-token:t@github.com/acme/kb.git").unwrap(),
            expected
        );
        assert_eq!(parse_repo_slug("git@github.com:acme/kb.git").unwrap(), expected);
        assert!(parse_repo_slug("https://github.com/acme").is_err());
        assert!(parse_repo_slug("not a url").is_err());
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        let host = GitHubContents::new(
            "https://github.com/acme/kb.git",
            "token",
            DEFAULT_API_BASE,
            Duration::from_secs(5),
        )
        .unwrap();

        let url = host.contents_url("concepts/Räumlich Denken_itself.md").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/kb/contents/concepts/R%C3%A4umlich%20Denken_itself.md"
        );
    }

    #[test]
    fn test_contents_url_with_path_base() {
        let host = GitHubContents::new(
            "https://github.com/acme/kb.git",
            "token",
            "https://ghe.example.com/api/v3/",
            Duration::from_secs(5),
        )
        .unwrap();

        let url = host.contents_url("README.md").unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/acme/kb/contents/README.md"
        );
    }
}
