//! The session: one store, one prototype cache, one metadata registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use docmodel_core::{builtin, ClassRef, DocRef, Document, Error, Obj, Value};
use docmodel_memdb::{ModelDb, Query};

use crate::exert::ExertContext;
use crate::instance::Layout;
use crate::metadata::{require_metadata, InMemoryMetadata, MetadataRegistry};
use crate::prototype::{Prototype, PrototypeCache};
use crate::{Instance, MixinView};

struct Inner {
    db: RwLock<ModelDb>,
    prototypes: PrototypeCache,
    metadata: Arc<dyn MetadataRegistry>,
}

/// Entry point of the runtime.
///
/// Cloning is cheap and every clone shares the same store and cache. The
/// expected lifecycle is: load the model during bootstrap, then instantiate
/// and query. Loading classes after their prototypes were built has no
/// effect on those prototypes.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(metadata: Arc<dyn MetadataRegistry>) -> Self {
        Self {
            inner: Arc::new(Inner {
                db: RwLock::new(ModelDb::new()),
                prototypes: PrototypeCache::new(),
                metadata,
            }),
        }
    }

    fn db(&self) -> RwLockReadGuard<'_, ModelDb> {
        self.inner.db.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn db_mut(&self) -> RwLockWriteGuard<'_, ModelDb> {
        self.inner.db.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the underlying store.
    pub fn read<R>(&self, f: impl FnOnce(&ModelDb) -> R) -> R {
        f(&self.db())
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataRegistry> {
        &self.inner.metadata
    }

    pub fn prototypes(&self) -> &PrototypeCache {
        &self.inner.prototypes
    }

    // Loading and creation

    /// Bulk load; see [`ModelDb::load`].
    pub fn load_model(&self, docs: impl IntoIterator<Item = Document>) -> Result<(), Error> {
        self.db_mut().load(docs)
    }

    /// Load a snapshot produced by [`Session::dump`], mixins included.
    pub fn restore(&self, docs: impl IntoIterator<Item = Document>) -> Result<(), Error> {
        self.db_mut().restore(docs)
    }

    pub fn add(&self, doc: Document) -> Result<(), Error> {
        self.db_mut().add(doc)
    }

    /// Create and store a document of a registered class.
    ///
    /// A fresh UUID is used when `id` is `None`.
    pub fn create_document(
        &self,
        class: &ClassRef,
        attributes: BTreeMap<String, Value>,
        id: Option<DocRef>,
    ) -> Result<Document, Error> {
        let mut db = self.db_mut();
        db.class_document(class)?;
        let id = id.unwrap_or_else(|| DocRef::from(uuid::Uuid::new_v4().to_string()));
        let doc = Document::new(class.clone(), id).with_attributes(attributes);
        db.add(doc.clone())?;
        Ok(doc)
    }

    pub fn get_document(&self, id: &DocRef) -> Result<Arc<Document>, Error> {
        self.db().get(id)
    }

    /// Snapshot of all documents, for persistence.
    pub fn dump(&self) -> Vec<Document> {
        self.db().dump()
    }

    // Class registry

    pub fn get_class_hierarchy(
        &self,
        class: &ClassRef,
        top: Option<&ClassRef>,
    ) -> Result<Vec<ClassRef>, Error> {
        self.db().get_class_hierarchy(class, top)
    }

    pub fn is(&self, class: &ClassRef, candidate: &ClassRef) -> Result<bool, Error> {
        self.db().is(class, candidate)
    }

    pub fn is_mixed_in(&self, doc: &Document, mixin: &ClassRef) -> bool {
        self.db().is_mixed_in(doc, mixin)
    }

    pub fn get_domain(&self, class: &ClassRef) -> Result<String, Error> {
        self.db().get_domain(class)
    }

    // Prototypes and instances

    pub fn get_prototype(&self, class: &ClassRef) -> Result<Arc<Prototype>, Error> {
        let db = self.db();
        self.inner
            .prototypes
            .get_or_build(class, &db, self.inner.metadata.as_ref())
    }

    /// Bind a document to its class's prototype.
    pub fn instantiate(&self, doc: Arc<Document>) -> Result<Instance, Error> {
        let prototype = self.get_prototype(&doc.class)?;
        Ok(Instance::new(Layout::Doc(doc), prototype, self.clone()))
    }

    /// Bind an embedded object to its class's prototype, without the store.
    pub fn instantiate_obj(&self, obj: Obj) -> Result<Instance, Error> {
        let prototype = self.get_prototype(&obj.class)?;
        Ok(Instance::new(Layout::Emb(Arc::new(obj)), prototype, self.clone()))
    }

    pub fn get_instance(&self, id: &DocRef) -> Result<Instance, Error> {
        let doc = self.get_document(id)?;
        self.instantiate(doc)
    }

    /// Instances of exactly `class` matching `query`.
    pub fn find(&self, class: &ClassRef, query: &Query) -> Result<Vec<Instance>, Error> {
        let docs = self.db().find_all(class, query);
        docs.into_iter().map(|doc| self.instantiate(doc)).collect()
    }

    pub fn find_one(&self, class: &ClassRef, query: &Query) -> Result<Option<Instance>, Error> {
        Ok(self.find(class, query)?.into_iter().next())
    }

    /// Like [`Session::find`], but includes documents of every subclass.
    pub fn find_deep(&self, class: &ClassRef, query: &Query) -> Result<Vec<Instance>, Error> {
        let docs: Vec<_> = {
            let db = self.db();
            let classes = db.subclasses(class)?;
            db.documents()
                .filter(|doc| classes.contains(&doc.class) && query.matches(doc))
                .cloned()
                .collect()
        };
        docs.into_iter().map(|doc| self.instantiate(doc)).collect()
    }

    // Mixins

    /// Attach `values` to `base` under `mixin_class`.
    ///
    /// Every value must be an attribute the mixin class (or one of its
    /// ancestors) declares. Returns the stored mixin document.
    pub fn mixin(
        &self,
        base: &DocRef,
        mixin_class: &ClassRef,
        values: BTreeMap<String, Value>,
    ) -> Result<Document, Error> {
        let prototype = self.get_prototype(mixin_class)?;
        if let Some(name) = values
            .keys()
            .find(|name| !builtin::is_reserved(name) && prototype.resolve(name).is_none())
        {
            return Err(Error::UnknownAttribute {
                class: mixin_class.clone(),
                name: name.clone(),
            });
        }

        let mixin = Document::new(mixin_class.clone(), base.clone()).with_attributes(values);
        let stored = self.db_mut().attach_mixin(mixin)?;
        Ok((*stored).clone())
    }

    /// The composite view of `base` through `mixin_class`.
    pub fn as_mixin(&self, base: &DocRef, mixin_class: &ClassRef) -> Result<MixinView, Error> {
        let (base_doc, mixin_doc) = {
            let db = self.db();
            (db.get(base)?, db.get_mixin(base, mixin_class)?)
        };
        Ok(MixinView::new(
            self.instantiate(mixin_doc)?,
            self.instantiate(base_doc)?,
        ))
    }

    // Adapters

    /// The adapter document converting resources of kind `from` to `to`.
    pub fn find_adapter(&self, from: &str, to: &str) -> Result<Instance, Error> {
        let query = Query::new().eq("from", from).eq("to", to);
        self.find_one(&ClassRef::from(builtin::ADAPTER), &query)?
            .ok_or_else(|| Error::AdapterNotFound {
                from: from.to_string(),
                to: to.to_string(),
            })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryMetadata::new()))
    }
}

impl ExertContext for Session {
    fn instantiate_obj(&self, obj: Obj) -> Result<Instance, Error> {
        Session::instantiate_obj(self, obj)
    }

    fn is(&self, class: &ClassRef, candidate: &ClassRef) -> Result<bool, Error> {
        Session::is(self, class, candidate)
    }

    fn metadata(&self, key: &str) -> Result<Value, Error> {
        require_metadata(self.inner.metadata.as_ref(), key)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("documents", &self.db().len())
            .field("prototypes", &self.inner.prototypes)
            .finish()
    }
}
