//! Error types shared by every docmodel layer.
//!
//! All of these are model-integrity faults: they mean the loaded schema or
//! data is inconsistent, not that something transient went wrong. Nothing in
//! the core retries or swallows them.

use crate::{ClassRef, DocRef};

/// Errors raised by the document store, class registry and session.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No document with this id.
    #[error("document not found: {id}")]
    NotFound { id: DocRef },

    /// Class reference does not resolve to a registered class.
    #[error("unknown class: {class}")]
    UnknownClass { class: ClassRef },

    /// Insertion collided with an existing document id.
    #[error("duplicate document id: {id}")]
    DuplicateId { id: DocRef },

    /// The `extends` chain revisits a class.
    #[error("cyclic class hierarchy at {class} (walk: {})", join(.walk))]
    CyclicHierarchy { class: ClassRef, walk: Vec<ClassRef> },

    /// No class in the ancestor chain declares a storage domain.
    #[error("no domain declared for {class} or any of its ancestors")]
    DomainNotFound { class: ClassRef },

    /// No adapter document converts between the two kinds.
    #[error("no adapter from '{from}' to '{to}'")]
    AdapterNotFound { from: String, to: String },

    /// The metadata registry has nothing under this key.
    #[error("metadata missing: {key}")]
    MetadataMissing { key: String },

    /// Attribute name not declared anywhere in the class chain.
    #[error("unknown attribute '{name}' on {class}")]
    UnknownAttribute { class: ClassRef, name: String },

    /// The document has not been extended with this mixin.
    #[error("{id} is not mixed in with {mixin}")]
    NotMixedIn { id: DocRef, mixin: ClassRef },

    /// A raw value does not have the shape its declared type requires.
    #[error("type mismatch for {context}: expected {expected}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
    },

    /// A serialized document or class definition is malformed.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },
}

impl Error {
    /// Shorthand for [`Error::InvalidDocument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidDocument {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::TypeMismatch`].
    pub fn mismatch(context: impl Into<String>, expected: &'static str) -> Self {
        Error::TypeMismatch {
            context: context.into(),
            expected,
        }
    }
}

fn join(walk: &[ClassRef]) -> String {
    walk.iter()
        .map(ClassRef::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
