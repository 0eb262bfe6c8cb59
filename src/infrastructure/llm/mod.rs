//! Language model providers.

pub mod factory;
pub mod gemini;
pub mod groq;

pub use factory::{create_language_model, ModelFactoryError};
pub use gemini::{GeminiClient, GeminiClientConfig};
pub use groq::{GroqClient, GroqClientConfig};
