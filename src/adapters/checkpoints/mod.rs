pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlCheckpointStore;
pub use memory::MemoryCheckpointStore;
