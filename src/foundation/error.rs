/// Convenience result type used across the crate.
pub type StatemapResult<T> = Result<T, StatemapError>;

/// Top-level error taxonomy for loading and library-level lookups.
///
/// Gesture handling never produces these: a gesture whose preconditions do not hold is a
/// no-op. Errors only surface from dataset loading and from library calls that name
/// something (an entity, a state) that does not exist.
#[derive(thiserror::Error, Debug)]
pub enum StatemapError {
    /// Malformed or inconsistent dataset.
    #[error("validation error: {0}")]
    Validation(String),

    /// A caller named an entity or state that the statemap does not contain.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StatemapError {
    /// Build a [`StatemapError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StatemapError::Lookup`] value.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Build a [`StatemapError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for StatemapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
