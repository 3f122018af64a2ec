//! Model backends, prompt construction and the retry loop.

pub mod backend;
pub mod gemini;
pub mod json;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod retry;

pub use backend::{ModelBackend, ModelResponse};
pub use gemini::GeminiBackend;
pub use json::parse_json_document;
pub use openai::OpenAiBackend;
pub use prompt::{CALL_FUNCTION_INSTRUCTION, EVAL_STATEMENT_INSTRUCTION, build_function_prompt};
pub use provider::{BackendSettings, Provider, build_backend};
pub use retry::{BackoffSchedule, run_with_retry};
