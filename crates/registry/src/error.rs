//! Typed errors for registry loading and registration.

/// Errors that can occur when loading or updating an operation table.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// JSON deserialization failed.
    #[error("invalid registry JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is malformed.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The name of the field that failed validation.
        field: String,
        /// A human-readable explanation of why the value is invalid.
        reason: String,
    },

    /// A name was registered twice.
    #[error("duplicate {kind} '{name}'")]
    Duplicate {
        /// What kind of entry was duplicated (`"operation"` or `"definition"`).
        kind: &'static str,
        /// The duplicated name.
        name: String,
    },

    /// A definition references an operation that is not in the table.
    #[error("definition '{definition}' references unknown operation '{operation}'")]
    UnknownOperation {
        /// Value name of the offending definition.
        definition: String,
        /// The operation name that could not be resolved.
        operation: String,
    },
}
