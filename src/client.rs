//! The two public operations.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::config::RetryPolicy;
use crate::error::{BackendError, ResponseTypeError};
use crate::interpret::{Rejection, coerce, interpret_boolean};
use crate::llm::backend::ModelBackend;
use crate::llm::prompt::{CALL_FUNCTION_INSTRUCTION, EVAL_STATEMENT_INSTRUCTION, build_function_prompt};
use crate::llm::provider::{BackendSettings, Provider, build_backend};
use crate::llm::retry::run_with_retry;
use crate::signature::FunctionCall;

/// Expected shape reported when a function declares no return type.
const UNDECLARED_RETURN: &str = "str";

/// Evaluates statements and simulates functions against one backend and model.
pub struct VibeClient {
    backend: Box<dyn ModelBackend>,
    model: String,
    policy: RetryPolicy,
}

impl VibeClient {
    pub fn new(
        backend: impl ModelBackend + 'static,
        model: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self::from_boxed(Box::new(backend), model, policy)
    }

    pub fn from_boxed(
        backend: Box<dyn ModelBackend>,
        model: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            policy,
        }
    }

    /// Build a client over the HTTP backend for `provider`.
    pub fn for_provider(
        provider: Provider,
        settings: &BackendSettings,
        model: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self, BackendError> {
        let model = model.into();
        let backend = build_backend(provider, settings)?;
        info!(
            "{} client ready: model={}, attempts={}",
            provider,
            model,
            policy.max_attempts()
        );
        Ok(Self::from_boxed(backend, model, policy))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Ask the model whether `statement` is true.
    ///
    /// Responses are read with [`interpret_boolean`]; anything without a
    /// recognizable verdict is retried.
    pub async fn evaluate_statement(&self, statement: &str) -> Result<bool, ResponseTypeError> {
        run_with_retry(
            &self.policy,
            "bool",
            statement,
            || self.round_trip(statement, EVAL_STATEMENT_INSTRUCTION),
            interpret_boolean,
        )
        .await
    }

    /// Ask the model for the value `call` would return.
    ///
    /// Without a declared return type the trimmed text comes back as a JSON
    /// string.
    pub async fn simulate_function(&self, call: &FunctionCall) -> Result<Value, ResponseTypeError> {
        self.simulate_with(call, Ok).await
    }

    /// Like [`simulate_function`](Self::simulate_function), deserializing into `T`.
    ///
    /// A value that cannot be deserialized into `T` counts as a type mismatch
    /// and is retried like any other.
    pub async fn simulate_function_as<T>(&self, call: &FunctionCall) -> Result<T, ResponseTypeError>
    where
        T: DeserializeOwned,
    {
        self.simulate_with(call, |value| {
            serde_json::from_value(value).map_err(|_| Rejection::TypeMismatch)
        })
        .await
    }

    async fn simulate_with<T, F>(&self, call: &FunctionCall, convert: F) -> Result<T, ResponseTypeError>
    where
        F: Fn(Value) -> Result<T, Rejection>,
    {
        let prompt = build_function_prompt(call);
        let return_type = call.return_type();
        let expected = return_type
            .map(ToString::to_string)
            .unwrap_or_else(|| UNDECLARED_RETURN.to_string());

        run_with_retry(
            &self.policy,
            &expected,
            &prompt,
            || self.round_trip(&prompt, CALL_FUNCTION_INSTRUCTION),
            |text| coerce(text, return_type).and_then(&convert),
        )
        .await
    }

    async fn round_trip(&self, prompt: &str, instruction: &str) -> Result<String, BackendError> {
        self.backend
            .generate(&self.model, prompt, instruction)
            .await
            .map(|response| response.into_text())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockall::Sequence;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::interpret::ReturnType;
    use crate::llm::backend::{MockModelBackend, ModelResponse};
    use crate::signature::FunctionSignature;

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(500), Duration::from_secs(8))
    }

    fn answering(backend: &mut MockModelBackend, seq: &mut Sequence, text: &'static str) {
        backend
            .expect_generate()
            .times(1)
            .in_sequence(seq)
            .returning(move |_, _, _| Ok(ModelResponse::text(text)));
    }

    fn add_call() -> FunctionCall {
        FunctionCall::new(
            FunctionSignature::new("add")
                .param("a", Some("int"))
                .param("b", Some("int"))
                .returns(ReturnType::Int),
        )
        .docstring("Add two numbers.")
        .arg(1)
        .arg(2)
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_statement_sends_statement_verbatim() {
        let mut backend = MockModelBackend::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|model, prompt, instruction| {
                assert_eq!(model, "gemini-test");
                assert_eq!(prompt, "The sky is blue");
                assert_eq!(instruction, EVAL_STATEMENT_INSTRUCTION);
                Ok(ModelResponse::text("True."))
            });

        let client = VibeClient::new(backend, "gemini-test", policy(1));
        assert_eq!(client.evaluate_statement("The sky is blue").await, Ok(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_statement_retries_until_verdict() {
        let mut backend = MockModelBackend::new();
        let mut seq = Sequence::new();
        answering(&mut backend, &mut seq, "I cannot say");
        answering(&mut backend, &mut seq, "FALSE");

        let client = VibeClient::new(backend, "m", policy(3));
        assert_eq!(client.evaluate_statement("X").await, Ok(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_statement_missing_text_is_rejected() {
        let mut backend = MockModelBackend::new();
        backend
            .expect_generate()
            .times(2)
            .returning(|_, _, _| Ok(ModelResponse::default()));

        let client = VibeClient::new(backend, "m", policy(2));
        let err = client.evaluate_statement("X").await.unwrap_err();
        assert_eq!(err.expected, "bool");
        assert_eq!(err.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_errors_are_absorbed_until_exhaustion() {
        let mut backend = MockModelBackend::new();
        backend.expect_generate().times(3).returning(|_, _, _| {
            Err(BackendError::ServerError {
                status: 503,
                message: "unavailable".to_string(),
            })
        });

        let client = VibeClient::new(backend, "m", policy(3));
        let err = client.evaluate_statement("X").await.unwrap_err();
        assert_eq!(
            err,
            ResponseTypeError {
                expected: "bool".to_string(),
                attempts: 3,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_function_coerces_int() {
        let mut backend = MockModelBackend::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|_, prompt, instruction| {
                assert_eq!(
                    prompt,
                    "Function Signature: add(a: int, b: int) -> int\n\
                     Docstring: Add two numbers.\n\
                     Arguments: [1, 2], {}\n\
                     Return Type: int"
                );
                assert_eq!(instruction, CALL_FUNCTION_INSTRUCTION);
                Ok(ModelResponse::text("3"))
            });

        let client = VibeClient::new(backend, "m", policy(1));
        assert_eq!(client.simulate_function(&add_call()).await, Ok(json!(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_function_retries_type_mismatch() {
        let mut backend = MockModelBackend::new();
        let mut seq = Sequence::new();
        answering(&mut backend, &mut seq, "three");
        answering(&mut backend, &mut seq, " 3\n");

        let client = VibeClient::new(backend, "m", policy(2));
        assert_eq!(client.simulate_function(&add_call()).await, Ok(json!(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_function_exhaustion_names_return_type() {
        let mut backend = MockModelBackend::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|_, _, _| Ok(ModelResponse::text("forty-two")));

        let client = VibeClient::new(backend, "m", policy(1));
        let err = client.simulate_function(&add_call()).await.unwrap_err();
        assert_eq!(err.expected, "int");
        assert_eq!(err.attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_undeclared_return_accepts_any_text() {
        let mut backend = MockModelBackend::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|_, _, _| Ok(ModelResponse::text("  Hello, Ada!  ")));

        let call = FunctionCall::new(FunctionSignature::new("greet").param("name", None))
            .kwarg("name", "Ada");
        let client = VibeClient::new(backend, "m", policy(3));
        assert_eq!(client.simulate_function(&call).await, Ok(json!("Hello, Ada!")));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_function_as_deserializes() {
        let mut backend = MockModelBackend::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|_, _, _| Ok(ModelResponse::text("```json\n{\"x\": 1, \"y\": 2, \"z\": 3}\n```")));

        let call = FunctionCall::new(FunctionSignature::new("origin_offset").returns(
            ReturnType::object("Point", [("x", ReturnType::Int), ("y", ReturnType::Int)]),
        ));
        let client = VibeClient::new(backend, "m", policy(1));
        assert_eq!(
            client.simulate_function_as::<Point>(&call).await,
            Ok(Point { x: 1, y: 2 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_function_as_retries_when_target_rejects() {
        let mut backend = MockModelBackend::new();
        let mut seq = Sequence::new();
        answering(&mut backend, &mut seq, "{\"x\": 1}");
        answering(&mut backend, &mut seq, "{\"x\": 1, \"y\": 5}");

        // Declared as loose JSON, so only the target type catches the missing field
        let call = FunctionCall::new(FunctionSignature::new("p").returns(ReturnType::Json));
        let client = VibeClient::new(backend, "m", policy(2));
        assert_eq!(
            client.simulate_function_as::<Point>(&call).await,
            Ok(Point { x: 1, y: 5 })
        );
    }

    #[test]
    fn test_accessors() {
        let client = VibeClient::new(MockModelBackend::new(), "gpt-test", policy(4));
        assert_eq!(client.model(), "gpt-test");
        assert_eq!(client.policy().max_attempts(), 4);
    }
}
