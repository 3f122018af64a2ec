//! Function signatures and simulation requests.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde_json::Value;

use crate::error::SignatureError;
use crate::interpret::ReturnType;
use crate::interpret::types::{split_top_level, top_level_indices};

static SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:def\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)\s*(?:->\s*(.+?))?\s*:?\s*$")
        .expect("Invalid regex")
});

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*{0,2}[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex"));

/// A declared parameter. The annotation is kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub annotation: Option<String>,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.annotation {
            Some(annotation) => write!(f, "{}: {}", self.name, annotation),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for Parameter {
    type Err = SignatureError;

    /// Parse `name`, `name: type` or `name: type = default`. Defaults are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let without_default = split_default(s);
        let (name, annotation) = match without_default.split_once(':') {
            Some((name, annotation)) => (name.trim(), Some(annotation.trim())),
            None => (without_default.trim(), None),
        };

        if !IDENT_RE.is_match(name) || annotation.is_some_and(str::is_empty) {
            return Err(SignatureError::InvalidParameter(s.trim().to_string()));
        }

        Ok(Parameter {
            name: name.to_string(),
            annotation: annotation.map(str::to_string),
        })
    }
}

/// Strip a top-level `= default` from a parameter declaration.
fn split_default(param: &str) -> &str {
    match top_level_indices(param, '=').first() {
        Some(&idx) => &param[..idx],
        None => param,
    }
}

/// Name, parameters and optional declared return type of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Option<ReturnType>,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: None,
        }
    }

    /// Add a parameter. An empty annotation is treated as none.
    pub fn param(mut self, name: impl Into<String>, annotation: Option<&str>) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            annotation: annotation
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        });
        self
    }

    pub fn returns(mut self, return_type: ReturnType) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn return_type(&self) -> Option<&ReturnType> {
        self.return_type.as_ref()
    }

    /// Parse `def add(a: int, b: int) -> int` and friends.
    pub fn parse(text: &str) -> Result<Self, SignatureError> {
        let caps = SIGNATURE_RE
            .captures(text)
            .ok_or_else(|| SignatureError::InvalidSignature(text.trim().to_string()))?;

        let name = caps[1].to_string();
        let params_text = caps[2].trim();
        let params = if params_text.is_empty() {
            Vec::new()
        } else {
            split_top_level(params_text)
                .into_iter()
                .filter(|p| !p.is_empty() && *p != "/" && *p != "*")
                .map(str::parse::<Parameter>)
                .collect::<Result<Vec<_>, _>>()?
        };

        let return_type = match caps.get(3).map(|m| m.as_str().trim()) {
            Some("None") | None => None,
            Some(annotation) => Some(annotation.parse::<ReturnType>()?),
        };

        Ok(Self {
            name,
            params,
            return_type,
        })
    }
}

impl FromStr for FunctionSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FunctionSignature::parse(s)
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")?;
        if let Some(return_type) = &self.return_type {
            write!(f, " -> {return_type}")?;
        }
        Ok(())
    }
}

/// One function simulation request.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub signature: FunctionSignature,
    pub docstring: String,
    pub args: Vec<Value>,
    /// Keyword arguments in the order they were given.
    pub kwargs: Vec<(String, Value)>,
}

impl FunctionCall {
    pub fn new(signature: FunctionSignature) -> Self {
        Self {
            signature,
            docstring: String::new(),
            args: Vec::new(),
            kwargs: Vec::new(),
        }
    }

    pub fn docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = docstring.into();
        self
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.push((name.into(), value.into()));
        self
    }

    pub fn return_type(&self) -> Option<&ReturnType> {
        self.signature.return_type()
    }
}
