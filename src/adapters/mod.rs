//! Adapters implementing the domain ports.

pub mod checkpoints;
pub mod github;
pub mod logs;
pub mod scripted_model;
pub mod simulated_publisher;
pub mod source;

pub use checkpoints::{JsonlCheckpointStore, MemoryCheckpointStore};
pub use github::{GitHubClient, GitHubPublisher};
pub use logs::FileLogSource;
pub use scripted_model::ScriptedModel;
pub use simulated_publisher::SimulatedPublisher;
pub use source::FileSourceReader;
