//! Coercion of raw model text into a declared return type.

use serde_json::{Map, Value};
use tracing::debug;

use super::{Rejection, ReturnType};
use crate::llm::json::parse_json_document;

/// Coerce raw model text into a value satisfying `expected`.
///
/// Without a declared type the trimmed text is accepted verbatim. `str` is a
/// pass-through, `bool` also accepts the bare words in any case, and every
/// other type is read as JSON and validated structurally.
pub fn coerce(raw: &str, expected: Option<&ReturnType>) -> Result<Value, Rejection> {
    let text = raw.trim();

    let Some(expected) = expected else {
        debug!("coerce: no expected type; returning raw text unchanged");
        return Ok(Value::String(text.to_string()));
    };

    match expected {
        ReturnType::Text => Ok(Value::String(text.to_string())),
        ReturnType::Bool => match text.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => {
                debug!("coerce: expected=bool; got {:?}", text);
                Err(Rejection::TypeMismatch)
            }
        },
        _ => {
            let Some(parsed) = parse_json_document(text) else {
                debug!("coerce: expected={}; JSON parse failed", expected);
                return Err(Rejection::TypeMismatch);
            };
            conform(parsed, expected).ok_or_else(|| {
                debug!("coerce: expected={}; value did not match", expected);
                Rejection::TypeMismatch
            })
        }
    }
}

/// Validate `value` against `expected`, returning the normalized value.
///
/// Containers are checked element by element without further coercion.
/// Objects keep only their declared fields.
fn conform(value: Value, expected: &ReturnType) -> Option<Value> {
    match (expected, value) {
        (ReturnType::Json, value) => Some(value),
        (ReturnType::Bool, value @ Value::Bool(_)) => Some(value),
        (ReturnType::Text, value @ Value::String(_)) => Some(value),
        (ReturnType::Int, Value::Number(n)) => n.as_i64().map(Value::from),
        // Integers are accepted as floats; `8` is a valid answer for `float`
        (ReturnType::Float, Value::Number(n)) => Some(Value::Number(n)),
        (ReturnType::List(element), Value::Array(items)) => items
            .into_iter()
            .map(|item| conform(item, element))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (ReturnType::Tuple(types), Value::Array(items)) => {
            if types.len() != items.len() {
                debug!(
                    "conform: tuple arity mismatch; expected={}; got={}",
                    types.len(),
                    items.len()
                );
                return None;
            }
            items
                .into_iter()
                .zip(types)
                .map(|(item, ty)| conform(item, ty))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        }
        (ReturnType::Map(value_type), Value::Object(entries)) => entries
            .into_iter()
            .map(|(key, item)| conform(item, value_type).map(|v| (key, v)))
            .collect::<Option<Map<_, _>>>()
            .map(Value::Object),
        (ReturnType::Object { name, fields }, Value::Object(mut entries)) => {
            let mut record = Map::new();
            for (field, ty) in fields {
                let Some(item) = entries.remove(field) else {
                    debug!("conform: {} is missing field '{}'", name, field);
                    return None;
                };
                record.insert(field.clone(), conform(item, ty)?);
            }
            Some(Value::Object(record))
        }
        _ => None,
    }
}
