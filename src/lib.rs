//! selfheal - self-healing SRE agent
//!
//! Given an incident description, selfheal investigates application logs with
//! a language model, proposes a fix for the failing source file, checks the
//! fix with a static validator, and opens a pull request once it passes.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): remediation state, stages, ports
//! - **Service Layer** (`services`): validator, stage handlers, orchestrator
//! - **Adapters** (`adapters`): log files, source files, GitHub, checkpoints
//! - **Infrastructure Layer** (`infrastructure`): config, logging, model providers, retry
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use selfheal::adapters::{FileLogSource, FileSourceReader, MemoryCheckpointStore, ScriptedModel, SimulatedPublisher};
//! use selfheal::domain::models::RunRequest;
//! use selfheal::infrastructure::RetryPolicy;
//! use selfheal::services::{Collaborators, OrchestratorSettings, RemediationOrchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let orchestrator = RemediationOrchestrator::new(
//!     Collaborators {
//!         model: Arc::new(ScriptedModel::dry_run()),
//!         logs: Arc::new(FileLogSource::new("app_logs.txt")),
//!         publisher: Arc::new(SimulatedPublisher::new(".")),
//!         source: Arc::new(FileSourceReader::new(".")),
//!         checkpoints: Arc::new(MemoryCheckpointStore::new()),
//!     },
//!     OrchestratorSettings::default(),
//!     RetryPolicy::default(),
//! );
//! let outcome = orchestrator
//!     .run(RunRequest::new("500 on /api/data"), None, CancellationToken::new())
//!     .await?;
//! println!("{}", outcome.terminal);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{CollaboratorError, DomainError, DomainResult};
pub use domain::models::{Config, RunOutcome, RunRequest, Stage, StateSnapshot};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{FixValidator, RemediationOrchestrator};
