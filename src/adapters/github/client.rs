//! GitHub HTTP client with rate limiting.
//!
//! Wraps the Git Data and Pulls endpoints of the GitHub REST API v3.
//! File content travels inline in tree entries, so nothing is base64
//! encoded. A token-bucket limiter keeps requests within the 5 000
//! req/hour authenticated limit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::errors::CollaboratorError;

use super::models::{
    CreateCommitRequest, CreatePullRequest, CreateRefRequest, CreateTreeRequest, GitCommit,
    GitObject, GitRef, GitTreeEntry, PullRequest,
};

/// Token-bucket rate limiter.
///
/// Allows up to `capacity` requests per `window`; when empty,
/// [`acquire`](RateLimiter::acquire) sleeps until the window resets.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    tokens: u32,
    window: Duration,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            tokens: capacity,
            window,
            window_start: Instant::now(),
        }
    }

    pub async fn acquire(&mut self) {
        let elapsed = self.window_start.elapsed();
        if elapsed >= self.window {
            self.tokens = self.capacity;
            self.window_start = Instant::now();
        }

        if self.tokens > 0 {
            self.tokens -= 1;
        } else {
            let remaining = self.window.saturating_sub(elapsed);
            tracing::warn!(
                sleep_ms = remaining.as_millis() as u64,
                "GitHub rate limit reached, sleeping"
            );
            tokio::time::sleep(remaining).await;
            self.tokens = self.capacity.saturating_sub(1);
            self.window_start = Instant::now();
        }
    }
}

/// HTTP client for one GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    token: String,
    api_url: String,
    owner: String,
    repo: String,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl GitHubClient {
    /// Create a client for `owner/repo`.
    pub fn new(
        token: impl Into<String>,
        repository: &str,
        api_url: impl Into<String>,
    ) -> Result<Self, CollaboratorError> {
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'))
            .ok_or_else(|| {
                CollaboratorError::InvalidRequest(format!(
                    "repository must be owner/name, got {repository:?}"
                ))
            })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CollaboratorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            token: token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(5_000, Duration::from_secs(3_600)))),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, self.owner, self.repo, path)
    }

    /// Acquire a rate-limit token and build an authorized request.
    async fn rate_limited_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.rate_limiter.lock().await.acquire().await;
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", "selfheal")
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CollaboratorError> {
        let resp = self
            .rate_limited_request(Method::GET, &self.repo_url(path))
            .await
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CollaboratorError> {
        let resp = self
            .rate_limited_request(Method::POST, &self.repo_url(path))
            .await
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, CollaboratorError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CollaboratorError::from_status(status, body));
        }
        resp.json::<T>()
            .await
            .map_err(|e| CollaboratorError::MalformedResponse(format!("GitHub response: {e}")))
    }

    /// Head commit sha of `branch`.
    pub async fn branch_head(&self, branch: &str) -> Result<String, CollaboratorError> {
        let git_ref: GitRef = self.get(&format!("git/ref/heads/{branch}")).await?;
        Ok(git_ref.object.sha)
    }

    pub async fn get_commit(&self, sha: &str) -> Result<GitCommit, CollaboratorError> {
        self.get(&format!("git/commits/{sha}")).await
    }

    /// Create a tree on top of `base_tree` with the given files; returns its sha.
    pub async fn create_tree(
        &self,
        base_tree: &str,
        files: Vec<GitTreeEntry>,
    ) -> Result<String, CollaboratorError> {
        let request = CreateTreeRequest {
            base_tree: base_tree.to_string(),
            tree: files,
        };
        let tree: GitObject = self.post("git/trees", &request).await?;
        Ok(tree.sha)
    }

    pub async fn create_commit(
        &self,
        message: &str,
        tree: &str,
        parent: &str,
    ) -> Result<String, CollaboratorError> {
        let request = CreateCommitRequest {
            message: message.to_string(),
            tree: tree.to_string(),
            parents: vec![parent.to_string()],
        };
        let commit: GitCommit = self.post("git/commits", &request).await?;
        Ok(commit.sha)
    }

    pub async fn create_branch(&self, branch: &str, sha: &str) -> Result<(), CollaboratorError> {
        let request = CreateRefRequest {
            name: format!("refs/heads/{branch}"),
            sha: sha.to_string(),
        };
        let _: GitRef = self.post("git/refs", &request).await?;
        Ok(())
    }

    pub async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, CollaboratorError> {
        let request = CreatePullRequest {
            title: title.to_string(),
            body: body.to_string(),
            head: head.to_string(),
            base: base.to_string(),
        };
        self.post("pulls", &request).await
    }
}
