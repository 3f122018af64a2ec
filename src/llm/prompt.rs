//! Prompt construction for both operations.

use serde_json::Value;

use crate::signature::FunctionCall;

/// System instruction for statement evaluation.
pub const EVAL_STATEMENT_INSTRUCTION: &str =
    "Evaluate the statement below and respond with either 'true' or 'false'.";

/// System instruction for function simulation.
pub const CALL_FUNCTION_INSTRUCTION: &str = concat!(
    "You will be given: a function signature (name, parameters, and return type); ",
    "a docstring describing what the function is intended to do; ",
    "the concrete arguments passed to the function; and the declared return value type. ",
    "Your task is to: (1) interpret the docstring to understand the intended behavior of the function, ",
    "(2) use the provided arguments to simulate what the function would logically produce, ",
    "(3) ensure your response strictly matches the declared return type, both in structure and data type, and ",
    "(4) return only the value that fulfills the function's contract, ",
    "with no explanations, commentary, or extra text."
);

/// Build the user content for a function simulation.
///
/// The `Return Type` line is only present when the signature declares one.
pub fn build_function_prompt(call: &FunctionCall) -> String {
    let mut prompt = format!(
        "Function Signature: {}\nDocstring: {}\nArguments: {}, {}",
        call.signature,
        call.docstring,
        render_args(&call.args),
        render_kwargs(&call.kwargs)
    );

    if let Some(return_type) = call.return_type() {
        prompt.push_str(&format!("\nReturn Type: {return_type}"));
    }

    prompt
}

fn render_args(args: &[Value]) -> String {
    let items: Vec<String> = args.iter().map(Value::to_string).collect();
    format!("[{}]", items.join(", "))
}

// Keyword order follows the call, so this does not go through `serde_json::Map`
fn render_kwargs(kwargs: &[(String, Value)]) -> String {
    let items: Vec<String> = kwargs
        .iter()
        .map(|(name, value)| format!("{}: {}", Value::from(name.as_str()), value))
        .collect();
    format!("{{{}}}", items.join(", "))
}
