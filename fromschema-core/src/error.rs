use std::fmt;

/// Why a `$ref` could not be resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReferenceErrorKind {
    /// The reference points at a location that does not exist.
    MissingTarget,
    /// The reference needs a network fetch, which is never performed.
    RemoteFetch,
    /// The reference relies on `$id` resolution this crate does not support.
    UnsupportedId,
    /// The reference is part of a cycle that never reaches a finite value.
    Recursive,
}

impl fmt::Display for ReferenceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceErrorKind::MissingTarget => write!(f, "reference target does not exist"),
            ReferenceErrorKind::RemoteFetch => write!(f, "does not fetch remote references"),
            ReferenceErrorKind::UnsupportedId => {
                write!(f, "could not resolve $id-based reference")
            }
            ReferenceErrorKind::Recursive => write!(f, "could not resolve recursive references"),
        }
    }
}

/// Errors raised while turning a schema into a generator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SchemaError {
    /// The schema document is malformed.
    InvalidSchema(String),
    /// The schema declares a draft that is not supported.
    UnsupportedDraft(String),
    /// A custom format registration is invalid.
    InvalidFormat(String),
    /// A generation config could not be parsed.
    InvalidConfig(String),
    /// A `$ref` could not be resolved.
    UnresolvableReference {
        reference: String,
        kind: ReferenceErrorKind,
    },
}

impl SchemaError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SchemaError::InvalidSchema(message.into())
    }

    pub(crate) fn unresolvable(reference: impl Into<String>, kind: ReferenceErrorKind) -> Self {
        SchemaError::UnresolvableReference {
            reference: reference.into(),
            kind,
        }
    }

    /// Returns true for the errors caused by bad caller input rather than by references.
    pub fn is_invalid_argument(&self) -> bool {
        !matches!(self, SchemaError::UnresolvableReference { .. })
    }

    /// Returns the reference failure kind, if this is a reference error.
    pub fn reference_kind(&self) -> Option<ReferenceErrorKind> {
        match self {
            SchemaError::UnresolvableReference { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::InvalidSchema(message) => write!(f, "invalid schema: {message}"),
            SchemaError::UnsupportedDraft(message) => {
                write!(f, "unsupported schema draft: {message}")
            }
            SchemaError::InvalidFormat(message) => write!(f, "invalid custom format: {message}"),
            SchemaError::InvalidConfig(message) => {
                write!(f, "invalid generation config: {message}")
            }
            SchemaError::UnresolvableReference { reference, kind } => {
                write!(f, "unresolvable reference '{reference}': {kind}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

pub(crate) const UNSATISFIABLE_PREFIX: &str = "unsatisfiable schema";
pub(crate) const HEALTH_PREFIX: &str = "generation health check failed";

/// Classification of the reason a draw from a schema strategy failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DrawFailure {
    /// No value can satisfy the schema.
    Unsatisfiable,
    /// A residual filter rejected too many candidates in a row.
    TooManyRejections,
    /// The schema or its options are invalid.
    Configuration,
}

impl DrawFailure {
    /// Classifies the message carried by a proptest `Reason`.
    pub fn classify(reason: &str) -> Self {
        if reason.starts_with(UNSATISFIABLE_PREFIX) {
            DrawFailure::Unsatisfiable
        } else if reason.starts_with(HEALTH_PREFIX) {
            DrawFailure::TooManyRejections
        } else {
            DrawFailure::Configuration
        }
    }
}

#[cfg(test)]
#[path = "../tests/internal/error_unit_tests.rs"]
mod tests;
