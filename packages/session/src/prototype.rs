//! Prototypes: per-class accessor tables, built lazily and memoized.
//!
//! A prototype holds accessors for the attributes its class declares and a
//! link to its parent's prototype. Inherited attributes are found by walking
//! that link, never copied down.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use docmodel_core::builtin::{self, field};
use docmodel_core::{ClassRef, Error, Type};
use docmodel_memdb::ModelDb;

use crate::metadata::{require_native, MetadataRegistry, NativeFn};
use crate::{Exerted, Instance};

/// Root accessor returning an instance's class document as an instance.
pub const CLASS_ACCESSOR: &str = "class";

/// How one attribute is resolved.
#[derive(Clone)]
pub enum Accessor {
    /// Housekeeping field, returned raw.
    Identity,
    /// Read the raw value and exert it through the declared type.
    Generated(Type),
    /// Natively supplied implementation.
    Native(NativeFn),
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Identity => f.write_str("Identity"),
            Accessor::Generated(ty) => f.debug_tuple("Generated").field(&ty.class).finish(),
            Accessor::Native(_) => f.write_str("Native"),
        }
    }
}

/// Accessor table for one class.
#[derive(Debug)]
pub struct Prototype {
    /// `None` for the builtin root prototype shared by all root classes.
    class: Option<ClassRef>,
    parent: Option<Arc<Prototype>>,
    accessors: BTreeMap<String, Accessor>,
}

impl Prototype {
    /// The housekeeping prototype every root class extends.
    fn root() -> Self {
        let mut accessors: BTreeMap<String, Accessor> = [field::CLASS, field::ID, field::MIXINS]
            .into_iter()
            .map(|name| (name.to_string(), Accessor::Identity))
            .collect();
        let class_of: NativeFn =
            Arc::new(|instance: &Instance| instance.class_instance().map(Exerted::Instance));
        accessors.insert(CLASS_ACCESSOR.to_string(), Accessor::Native(class_of));
        Self {
            class: None,
            parent: None,
            accessors,
        }
    }

    pub fn class(&self) -> Option<&ClassRef> {
        self.class.as_ref()
    }

    pub fn parent(&self) -> Option<&Arc<Prototype>> {
        self.parent.as_ref()
    }

    /// Accessor declared on this prototype only.
    pub fn own_accessor(&self, name: &str) -> Option<&Accessor> {
        self.accessors.get(name)
    }

    /// Accessor for `name`, searching this prototype then its ancestors.
    pub fn resolve(&self, name: &str) -> Option<&Accessor> {
        self.chain().find_map(|proto| proto.accessors.get(name))
    }

    /// This prototype followed by each ancestor, ending at the builtin root.
    pub fn chain(&self) -> impl Iterator<Item = &Prototype> {
        std::iter::successors(Some(self), |proto| proto.parent.as_deref())
    }

    /// Every attribute name declared along the chain. The root prototype's
    /// housekeeping accessors and `_` fields are excluded.
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .chain()
            .filter(|proto| proto.class.is_some())
            .flat_map(|proto| proto.accessors.keys().map(String::as_str))
            .filter(|name| !builtin::is_reserved(name))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Memoized prototypes for one session.
///
/// Populated lazily as classes are first instantiated, read-only after that,
/// and dropped with the session. Class metadata is assumed static once
/// bootstrap has loaded it, so a prototype is never rebuilt.
pub struct PrototypeCache {
    root: Arc<Prototype>,
    prototypes: RwLock<HashMap<ClassRef, Arc<Prototype>>>,
}

impl PrototypeCache {
    pub fn new() -> Self {
        Self {
            root: Arc::new(Prototype::root()),
            prototypes: RwLock::new(HashMap::new()),
        }
    }

    /// The builtin root prototype.
    pub fn root(&self) -> &Arc<Prototype> {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.prototypes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, class: &ClassRef) -> bool {
        self.prototypes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(class)
    }

    /// The prototype for `class`, building it (and any missing ancestors) on
    /// first use.
    ///
    /// Building happens outside the lock. When two callers race on the same
    /// class, the first insertion is kept and both get that same `Arc`.
    pub fn get_or_build(
        &self,
        class: &ClassRef,
        db: &ModelDb,
        metadata: &dyn MetadataRegistry,
    ) -> Result<Arc<Prototype>, Error> {
        if let Some(proto) = self
            .prototypes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class)
        {
            return Ok(proto.clone());
        }

        // Validates the whole chain (unknown ancestors, cycles) before the
        // recursive build below relies on it terminating.
        db.get_class_hierarchy(class, None)?;

        let built = Arc::new(self.build(class, db, metadata)?);
        let mut prototypes = self
            .prototypes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(prototypes.entry(class.clone()).or_insert(built).clone())
    }

    fn build(
        &self,
        class: &ClassRef,
        db: &ModelDb,
        metadata: &dyn MetadataRegistry,
    ) -> Result<Prototype, Error> {
        log::debug!("Building prototype for {}", class);
        let parsed = db.get_class(class)?;
        let parent = match &parsed.extends {
            Some(parent) => self.get_or_build(parent, db, metadata)?,
            None => self.root.clone(),
        };

        let mut accessors: BTreeMap<String, Accessor> = parsed
            .attributes
            .into_iter()
            .map(|(name, ty)| {
                let accessor = if builtin::is_reserved(&name) {
                    Accessor::Identity
                } else {
                    Accessor::Generated(ty)
                };
                (name, accessor)
            })
            .collect();

        if let Some(key) = &parsed.native {
            let native = require_native(metadata, key)?;
            for (name, f) in native.methods() {
                accessors.insert(name.to_string(), Accessor::Native(f.clone()));
            }
        }

        Ok(Prototype {
            class: Some(class.clone()),
            parent: Some(parent),
            accessors,
        })
    }
}

impl Default for PrototypeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PrototypeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prototypes = self
            .prototypes
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("PrototypeCache")
            .field("classes", &prototypes.keys().collect::<Vec<_>>())
            .finish()
    }
}
