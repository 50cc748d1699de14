//! The metadata registry collaborator.
//!
//! Two kinds of entries live here: plain metadata values, consulted by
//! `MetadataBacked` attribute types, and native implementations, overlaid on
//! generated prototypes for classes that declare `_native`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use docmodel_core::{Error, Value};

use crate::{Exerted, Instance};

/// A natively supplied accessor or method.
pub type NativeFn = Arc<dyn Fn(&Instance) -> Result<Exerted, Error> + Send + Sync>;

/// A set of named native accessors for one class.
#[derive(Clone, Default)]
pub struct NativeImpl {
    methods: BTreeMap<String, NativeFn>,
}

impl NativeImpl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method registration.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Instance) -> Result<Exerted, Error> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }

    pub fn get(&self, name: &str) -> Option<&NativeFn> {
        self.methods.get(name)
    }

    pub fn methods(&self) -> impl Iterator<Item = (&str, &NativeFn)> {
        self.methods.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Debug for NativeImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeImpl")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Process-wide lookup of metadata and native implementations.
pub trait MetadataRegistry: Send + Sync {
    fn get_metadata(&self, key: &str) -> Option<Value>;

    fn get_native(&self, key: &str) -> Option<Arc<NativeImpl>>;
}

/// Lookup that turns a registry miss into `MetadataMissing`.
pub(crate) fn require_metadata(registry: &dyn MetadataRegistry, key: &str) -> Result<Value, Error> {
    registry.get_metadata(key).ok_or_else(|| Error::MetadataMissing {
        key: key.to_string(),
    })
}

pub(crate) fn require_native(
    registry: &dyn MetadataRegistry,
    key: &str,
) -> Result<Arc<NativeImpl>, Error> {
    registry.get_native(key).ok_or_else(|| Error::MetadataMissing {
        key: key.to_string(),
    })
}

/// A registry held in memory, populated during bootstrap.
///
/// Interior mutability lets one instance be shared behind an `Arc` between
/// the session and whatever code registers plugins.
#[derive(Default)]
pub struct InMemoryMetadata {
    metadata: RwLock<HashMap<String, Value>>,
    natives: RwLock<HashMap<String, Arc<NativeImpl>>>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    pub fn set_native(&self, key: impl Into<String>, native: NativeImpl) {
        self.natives
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), Arc::new(native));
    }
}

impl MetadataRegistry for InMemoryMetadata {
    fn get_metadata(&self, key: &str) -> Option<Value> {
        self.metadata
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn get_native(&self, key: &str) -> Option<Arc<NativeImpl>> {
        self.natives
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl fmt::Debug for InMemoryMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.metadata.read().unwrap_or_else(PoisonError::into_inner);
        let natives = self.natives.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("InMemoryMetadata")
            .field("metadata", &metadata.keys().collect::<Vec<_>>())
            .field("natives", &natives.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_roundtrip() {
        let registry = InMemoryMetadata::new();
        registry.set_metadata("asset:task.Icon", "/img/task.svg");
        assert_eq!(
            registry.get_metadata("asset:task.Icon"),
            Some(Value::from("/img/task.svg"))
        );
        assert_eq!(registry.get_metadata("asset:task.Missing"), None);
    }

    #[test]
    fn missing_metadata_is_an_error() {
        let registry = InMemoryMetadata::new();
        assert_eq!(
            require_metadata(&registry, "asset:x"),
            Err(Error::MetadataMissing {
                key: "asset:x".to_string()
            })
        );
        assert!(matches!(
            require_native(&registry, "native:x"),
            Err(Error::MetadataMissing { .. })
        ));
    }

    #[test]
    fn native_methods_are_listed() {
        let native = NativeImpl::new()
            .method("b", |_| Ok(Exerted::Absent))
            .method("a", |_| Ok(Exerted::Absent));
        let names: Vec<_> = native.methods().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(native.get("a").is_some());
        assert!(native.get("c").is_none());
    }
}
