//! The model-serving seam.

use async_trait::async_trait;

use crate::error::BackendError;

/// Response from one round trip. Only the text is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: Option<String>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// The response text, empty when the backend returned none.
    pub fn into_text(self) -> String {
        self.text.unwrap_or_default()
    }
}

/// A model-serving backend.
///
/// This abstraction allows mocking the backend in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send `prompt` as user content with `system_instruction` to `model`.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<ModelResponse, BackendError>;
}
