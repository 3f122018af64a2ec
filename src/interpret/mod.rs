//! Turning raw model text into booleans and typed values.

pub mod boolean;
pub mod coerce;
pub mod types;

use std::fmt;

pub use boolean::interpret_boolean;
pub use coerce::coerce;
pub use types::ReturnType;

/// Why a successfully received response was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoBoolean,
    TypeMismatch,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::NoBoolean => "no boolean found",
            Rejection::TypeMismatch => "type mismatch",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
