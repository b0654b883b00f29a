//! Error types for instantiation

use thiserror::Error;

/// Errors that can occur while building objects from templates.
///
/// `E` is the object system's own error type; it is passed through unchanged.
#[derive(Debug, Error)]
pub enum InstantiateError<E: std::error::Error + 'static> {
    /// A cross-reference names an id that no template in the document has
    #[error("property '{property}' of '{owner}' references unknown id '{id}'")]
    MissingReference {
        id: String,
        property: String,
        owner: String,
    },

    /// References loop back into an object still being built on demand
    #[error("circular reference: {}", chain.join(" -> "))]
    CircularReference { chain: Vec<String> },

    /// Property text that cannot be coerced
    #[error("invalid value {raw:?} for property '{property}': {reason}")]
    InvalidValue {
        property: String,
        raw: String,
        reason: String,
    },

    /// No template with this id
    #[error("no template with id '{id}'")]
    UnknownTemplate { id: String },

    /// The target registry already holds an object for this id
    #[error("id '{id}' is already registered")]
    AlreadyRegistered { id: String },

    #[error(transparent)]
    ObjectSystem(E),
}

impl<E: std::error::Error + 'static> InstantiateError<E> {
    /// Create a missing reference error
    pub fn missing_reference(id: impl Into<String>, property: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::MissingReference {
            id: id.into(),
            property: property.into(),
            owner: owner.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(property: impl Into<String>, raw: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidValue {
            property: property.into(),
            raw: raw.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::MemoryError;

    #[test]
    fn test_circular_display() {
        let err: InstantiateError<MemoryError> = InstantiateError::CircularReference {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "circular reference: a -> b -> a");
    }

    #[test]
    fn test_object_system_error_is_transparent() {
        let inner = MemoryError::NotAContainer {
            class: "NsLabel".to_string(),
        };
        let err = InstantiateError::ObjectSystem(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
    }
}
