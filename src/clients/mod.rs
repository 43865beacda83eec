pub mod ai_model_client;

pub use ai_model_client::{AiModelClient, ModelMetadata, MAX_POLL_ATTEMPTS};
