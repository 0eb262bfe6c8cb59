//! GitHub REST API request and response models.
//!
//! Only the Git Data and Pulls payloads the publisher needs.

use serde::{Deserialize, Serialize};

/// A git object pointer (`{"sha": ..}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitObject {
    pub sha: String,
}

/// Response of `GET /git/ref/heads/{branch}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: GitObject,
}

/// Response of `GET /git/commits/{sha}` and `POST /git/commits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitCommit {
    pub sha: String,
    pub tree: GitObject,
}

/// One entry of a tree creation request, with inline file content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitTreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl GitTreeEntry {
    /// Regular file blob with UTF-8 content.
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: "100644".to_string(),
            kind: "blob".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `POST /git/trees`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTreeRequest {
    pub base_tree: String,
    pub tree: Vec<GitTreeEntry>,
}

/// Request body for `POST /git/commits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommitRequest {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

/// Request body for `POST /git/refs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRefRequest {
    #[serde(rename = "ref")]
    pub name: String,
    pub sha: String,
}

/// Request body for `POST /pulls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

/// Response of `POST /pulls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}
