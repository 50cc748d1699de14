//! Typed references to classes and documents.
//!
//! Both are plain strings on the wire. Keeping them as distinct newtypes stops
//! a document id from being handed to something that expects a class.

use std::fmt;

macro_rules! string_ref {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Create a reference from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The reference as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the reference, returning the owned string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_ref! {
    /// Reference to a class document, e.g. `class:task.Task`.
    ClassRef
}

string_ref! {
    /// Identifier of a document in the store.
    DocRef
}

impl ClassRef {
    /// Every class is itself a document; this is its id in the store.
    pub fn as_doc_ref(&self) -> DocRef {
        DocRef(self.0.clone())
    }
}

impl DocRef {
    /// Interpret a document id as a class reference.
    pub fn as_class_ref(&self) -> ClassRef {
        ClassRef(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_ref_display_and_compare() {
        let c = ClassRef::from("class:task.Task");
        assert_eq!(c.to_string(), "class:task.Task");
        assert_eq!(c, "class:task.Task");
        assert_eq!(c.as_doc_ref(), DocRef::from("class:task.Task"));
    }

    #[test]
    fn doc_ref_roundtrips_through_class_ref() {
        let d = DocRef::new(String::from("class:core.Doc"));
        assert_eq!(d.as_class_ref().as_doc_ref(), d);
        assert_eq!(d.into_string(), "class:core.Doc");
    }
}
