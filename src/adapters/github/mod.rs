//! GitHub pull-request publication.

pub mod client;
pub mod models;
pub mod publisher;

pub use client::GitHubClient;
pub use publisher::{fix_branch_name, GitHubPublisher};
