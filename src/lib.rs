//! vibecheck - Ask a language model to judge statements and simulate functions.
//!
//! # Overview
//!
//! Two operations are exposed through [`VibeClient`]: evaluating a
//! natural-language statement to a boolean, and simulating the return value of
//! a function from its signature, docstring and arguments. Every model answer
//! goes through an acceptance check; rejected answers and transport failures
//! are retried with capped exponential backoff until the configured attempts
//! run out, at which point a single [`ResponseTypeError`] is returned.

pub mod client;
pub mod config;
pub mod error;
pub mod interpret;
pub mod llm;
pub mod logging;
pub mod signature;

// Re-export commonly used types
pub use client::VibeClient;
pub use config::{RetryPolicy, VibeCheckConfig};
pub use error::{BackendError, ConfigError, ResponseTypeError, SignatureError};
pub use interpret::ReturnType;
pub use llm::{BackendSettings, ModelBackend, ModelResponse, Provider};
pub use signature::{FunctionCall, FunctionSignature};
