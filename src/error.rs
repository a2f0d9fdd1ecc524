use std::fmt;

/// Errors that can occur when using a guarded lexicon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The requested key was not found (closure accessors only)
    KeyNotFound(String),
    /// Attempted to access a value with a type that doesn't match what was stored
    TypeMismatch,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MapError::KeyNotFound(key) => write!(f, "Key not found in lexicon: {}", key),
            MapError::TypeMismatch => write!(f, "Type mismatch for the requested key"),
        }
    }
}

impl std::error::Error for MapError {}
