//! Class registry: hierarchy questions answered over the stored class
//! documents.
//!
//! Classes are ordinary documents keyed by their class id, so every walk here
//! is a chain of point lookups following `_extends`.

use std::collections::HashSet;
use std::sync::Arc;

use docmodel_core::{
    builtin, BuiltinType, Class, ClassRef, Document, Error, Type, TypeResolver,
};

use crate::{ModelDb, Query};

impl ModelDb {
    /// The stored document defining `class`.
    pub fn class_document(&self, class: &ClassRef) -> Result<Arc<Document>, Error> {
        self.get(&class.as_doc_ref()).map_err(|_| Error::UnknownClass {
            class: class.clone(),
        })
    }

    /// Parsed view of a class, with attribute types resolved.
    pub fn get_class(&self, class: &ClassRef) -> Result<Class, Error> {
        let doc = self.class_document(class)?;
        Class::from_document(&doc, self)
    }

    /// `class` first, then each ancestor up to and including `top` (or the
    /// root when `top` is `None` or never reached).
    pub fn get_class_hierarchy(
        &self,
        class: &ClassRef,
        top: Option<&ClassRef>,
    ) -> Result<Vec<ClassRef>, Error> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(class.clone());

        while let Some(class) = current {
            if !seen.insert(class.clone()) {
                result.push(class.clone());
                return Err(Error::CyclicHierarchy {
                    class,
                    walk: result,
                });
            }
            let doc = self.class_document(&class)?;
            let reached_top = top == Some(&class);
            result.push(class);
            if reached_top {
                break;
            }
            current = Class::extends_of(&doc)?;
        }

        Ok(result)
    }

    /// True iff `candidate` is `class` or one of its ancestors.
    pub fn is(&self, class: &ClassRef, candidate: &ClassRef) -> Result<bool, Error> {
        Ok(self.get_class_hierarchy(class, None)?.contains(candidate))
    }

    /// True iff `mixin` is recorded in the document's mixin set.
    ///
    /// Exact match only: mixing in a subclass does not make its ancestors
    /// count as mixed in.
    pub fn is_mixed_in(&self, doc: &Document, mixin: &ClassRef) -> bool {
        doc.mixins.contains(mixin)
    }

    /// Storage domain of `class`: the first `_domain` walking self to root.
    pub fn get_domain(&self, class: &ClassRef) -> Result<String, Error> {
        for ancestor in self.get_class_hierarchy(class, None)? {
            let doc = self.class_document(&ancestor)?;
            if let Some(domain) = Class::domain_of(&doc)? {
                return Ok(domain);
            }
        }
        Err(Error::DomainNotFound {
            class: class.clone(),
        })
    }

    /// The class declaring attribute `name` for `class`, and its type.
    ///
    /// Walks self to root; the nearest declaration wins.
    pub fn find_attribute(
        &self,
        class: &ClassRef,
        name: &str,
    ) -> Result<Option<(ClassRef, Type)>, Error> {
        for ancestor in self.get_class_hierarchy(class, None)? {
            let mut parsed = self.get_class(&ancestor)?;
            if let Some(ty) = parsed.attributes.remove(name) {
                return Ok(Some((ancestor, ty)));
            }
        }
        Ok(None)
    }

    /// True if `doc` defines a class (its own class derives from
    /// `class:core.Class`).
    ///
    /// A document whose class chain is broken is an error, not `false`.
    pub fn is_class_document(&self, doc: &Document) -> Result<bool, Error> {
        if doc.class == builtin::CLASS {
            return Ok(true);
        }
        self.is(&doc.class, &ClassRef::from(builtin::CLASS))
    }

    /// Class documents matching `query`, in insertion order.
    pub fn find_classes(&self, query: &Query) -> Result<Vec<Arc<Document>>, Error> {
        let mut result = Vec::new();
        for doc in self.documents() {
            if self.is_class_document(doc)? && query.matches(doc) {
                result.push(doc.clone());
            }
        }
        Ok(result)
    }

    /// `class` and every registered class deriving from it.
    ///
    /// Used by callers that want subclass-inclusive search on top of the
    /// exact-class [`ModelDb::find_all`].
    pub fn subclasses(&self, class: &ClassRef) -> Result<Vec<ClassRef>, Error> {
        self.class_document(class)?;
        let mut result = Vec::new();
        for doc in self.find_classes(&Query::new())? {
            let id = doc.id.as_class_ref();
            if self.is(&id, class)? {
                result.push(id);
            }
        }
        Ok(result)
    }
}

impl TypeResolver for ModelDb {
    /// Walk the type class's `extends` chain until a builtin type class.
    ///
    /// Builtin type classes resolve even when their class documents were
    /// never loaded.
    fn builtin_type(&self, type_class: &ClassRef) -> Result<BuiltinType, Error> {
        let mut seen = HashSet::new();
        let mut walk = Vec::new();
        let mut current = type_class.clone();
        loop {
            if let Some(builtin) = BuiltinType::from_class(current.as_str()) {
                return Ok(builtin);
            }
            walk.push(current.clone());
            if !seen.insert(current.clone()) {
                return Err(Error::CyclicHierarchy {
                    class: current,
                    walk,
                });
            }
            let doc = self.class_document(&current)?;
            current = Class::extends_of(&doc)?.ok_or_else(|| {
                Error::invalid(format!("{} is not a type class", type_class))
            })?;
        }
    }
}
