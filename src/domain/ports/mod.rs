//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces implemented by adapters:
//! - LanguageModel: text generation with optional tool requests
//! - LogSource: recent application log retrieval
//! - Publisher: change request creation
//! - SourceReader: read access to the file under repair
//! - CheckpointStore: per-run snapshot persistence

pub mod checkpoint_store;
pub mod language_model;
pub mod log_source;
pub mod publisher;
pub mod source_reader;

pub use checkpoint_store::CheckpointStore;
pub use language_model::{LanguageModel, ModelReply, Prompt, PromptKind, ToolCall, ToolKind};
pub use log_source::{LogFetch, LogSource};
pub use publisher::{truncate_title, PublishReceipt, PublishRequest, Publisher, MAX_TITLE_CHARS};
pub use source_reader::SourceReader;
