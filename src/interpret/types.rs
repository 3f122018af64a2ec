//! Declared return types for simulated functions.
//!
//! A [`ReturnType`] is a closed set of tags. Each tag knows how to render
//! itself for the prompt and how to validate a JSON value (see
//! [`super::coerce`]). Annotations are parsed from Python-style text such as
//! `list[int]` or `dict[str, float]`.

use std::fmt;
use std::str::FromStr;

use crate::error::SignatureError;

/// The contract a simulated function's result must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnType {
    Bool,
    Int,
    Float,
    Text,
    /// Homogeneous array.
    List(Box<ReturnType>),
    /// Fixed-arity array, validated position by position.
    Tuple(Vec<ReturnType>),
    /// Object with string keys and homogeneous values.
    Map(Box<ReturnType>),
    /// Named record. Undeclared keys are dropped, declared ones are required.
    Object {
        name: String,
        fields: Vec<(String, ReturnType)>,
    },
    /// Any JSON document.
    Json,
}

impl ReturnType {
    pub fn list(element: ReturnType) -> Self {
        ReturnType::List(Box::new(element))
    }

    pub fn map(value: ReturnType) -> Self {
        ReturnType::Map(Box::new(value))
    }

    pub fn object<N, F, I>(name: N, fields: I) -> Self
    where
        N: Into<String>,
        F: Into<String>,
        I: IntoIterator<Item = (F, ReturnType)>,
    {
        ReturnType::Object {
            name: name.into(),
            fields: fields.into_iter().map(|(f, t)| (f.into(), t)).collect(),
        }
    }

    /// Whether the raw text is used as-is instead of being parsed as JSON.
    pub fn is_text(&self) -> bool {
        matches!(self, ReturnType::Text)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Bool => f.write_str("bool"),
            ReturnType::Int => f.write_str("int"),
            ReturnType::Float => f.write_str("float"),
            ReturnType::Text => f.write_str("str"),
            ReturnType::Json => f.write_str("json"),
            ReturnType::List(element) => write!(f, "list[{element}]"),
            ReturnType::Map(value) => write!(f, "dict[str, {value}]"),
            ReturnType::Tuple(items) => {
                f.write_str("tuple[")?;
                write_joined(f, items.iter().map(|t| t.to_string()))?;
                f.write_str("]")
            }
            ReturnType::Object { name, fields } => {
                write!(f, "{name}(")?;
                write_joined(f, fields.iter().map(|(n, t)| format!("{n}: {t}")))?;
                f.write_str(")")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = String>) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(&item)?;
    }
    Ok(())
}

impl FromStr for ReturnType {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let annotation = s.trim();
        let unsupported = || SignatureError::UnsupportedType(annotation.to_string());

        let (head, args) = match annotation.find('[') {
            Some(open) => {
                let inner = annotation[open + 1..]
                    .strip_suffix(']')
                    .ok_or_else(unsupported)?;
                (annotation[..open].trim(), Some(split_top_level(inner)))
            }
            None => (annotation, None),
        };

        // `typing.List` and `List` read the same as `list`
        let head = head.rsplit('.').next().unwrap_or(head).to_ascii_lowercase();

        match (head.as_str(), args.as_deref()) {
            ("bool" | "boolean", None) => Ok(ReturnType::Bool),
            ("int" | "integer", None) => Ok(ReturnType::Int),
            ("float" | "number", None) => Ok(ReturnType::Float),
            ("str" | "string" | "text", None) => Ok(ReturnType::Text),
            ("json" | "any", None) => Ok(ReturnType::Json),
            ("list" | "sequence", None) => Ok(ReturnType::list(ReturnType::Json)),
            ("list" | "sequence", Some([element])) => {
                Ok(ReturnType::list(element.parse::<ReturnType>()?))
            }
            ("dict" | "mapping", None) => Ok(ReturnType::map(ReturnType::Json)),
            ("dict" | "mapping", Some([key, value])) => {
                let key: ReturnType = key.parse()?;
                if !key.is_text() {
                    return Err(unsupported());
                }
                Ok(ReturnType::map(value.parse::<ReturnType>()?))
            }
            ("tuple", Some([element, "..."])) => {
                Ok(ReturnType::list(element.parse::<ReturnType>()?))
            }
            ("tuple", Some(items)) => Ok(ReturnType::Tuple(
                items
                    .iter()
                    .map(|item| item.parse::<ReturnType>())
                    .collect::<Result<_, _>>()?,
            )),
            _ => Err(unsupported()),
        }
    }
}

/// Split `a, b[c, d], e` on commas that are not nested inside brackets.
pub(crate) fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for idx in top_level_indices(text, ',') {
        parts.push(text[start..idx].trim());
        start = idx + 1;
    }
    parts.push(text[start..].trim());
    parts
}

/// Byte offsets of `target` outside brackets and quoted string literals.
///
/// Unbalanced closing brackets never push the depth below zero.
pub(crate) fn top_level_indices(text: &str, target: char) -> Vec<usize> {
    let mut found = Vec::new();
    let mut depth = 0u32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if let Some(open) = quote {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if ch == open => quote = None,
                _ => {}
            }
            continue;
        }

        match ch {
            '\'' | '"' => quote = Some(ch),
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            _ if ch == target && depth == 0 => found.push(idx),
            _ => {}
        }
    }
    found
}
