//! The document store: keyed, in-memory holder of raw documents.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use docmodel_core::{ClassRef, DocRef, Document, Error};

use crate::Query;

/// In-memory document store.
///
/// Documents are kept behind `Arc` so handing them to instances is cheap.
/// Base documents are keyed by id; mixin documents share their base's id and
/// are keyed by `(id, mixin class)` in a separate table.
///
/// # Example
///
/// ```rust
/// use docmodel_core::Document;
/// use docmodel_memdb::{ModelDb, Query};
///
/// let mut db = ModelDb::new();
/// db.add(Document::new("class:task.Task", "t1").with("name", "Fix bug")).unwrap();
///
/// let found = db.find_all(&"class:task.Task".into(), &Query::new().eq("name", "Fix bug"));
/// assert_eq!(found.len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ModelDb {
    docs: HashMap<DocRef, Arc<Document>>,
    /// Insertion order of `docs`, so scans and dumps are deterministic.
    order: Vec<DocRef>,
    mixins: HashMap<(DocRef, ClassRef), Arc<Document>>,
    mixin_order: Vec<(DocRef, ClassRef)>,
}

impl ModelDb {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of base documents (mixin documents are not counted).
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Bulk insert.
    ///
    /// The whole batch is checked before anything is inserted: an id that
    /// collides with a stored document, or appears twice in the batch, fails
    /// with `DuplicateId` and leaves the store untouched.
    pub fn load(&mut self, docs: impl IntoIterator<Item = Document>) -> Result<(), Error> {
        let docs: Vec<Document> = docs.into_iter().collect();
        let mut seen = HashSet::with_capacity(docs.len());
        for doc in &docs {
            if self.docs.contains_key(&doc.id) || !seen.insert(&doc.id) {
                return Err(Error::DuplicateId { id: doc.id.clone() });
            }
        }

        log::debug!("Loading {} documents...", docs.len());
        self.order.reserve(docs.len());
        for doc in docs {
            self.insert(doc);
        }
        Ok(())
    }

    /// Load a snapshot produced by [`ModelDb::dump`].
    ///
    /// A document is restored as a mixin document when another document
    /// with its id (in the batch or already stored) lists the document's
    /// class in `_mixins`; order within the batch does not matter. Everything
    /// else goes through [`ModelDb::load`], so base documents keep its
    /// all-or-nothing duplicate check.
    pub fn restore(&mut self, docs: impl IntoIterator<Item = Document>) -> Result<(), Error> {
        let docs: Vec<Document> = docs.into_iter().collect();
        let mut declared: HashMap<&DocRef, BTreeSet<&ClassRef>> = HashMap::new();
        for doc in &docs {
            declared.entry(&doc.id).or_default().extend(&doc.mixins);
            if let Some(stored) = self.docs.get(&doc.id) {
                declared.entry(&doc.id).or_default().extend(&stored.mixins);
            }
        }
        let is_mixin: Vec<bool> = docs
            .iter()
            .map(|doc| declared[&doc.id].contains(&doc.class))
            .collect();

        let (mut bases, mut mixins) = (Vec::new(), Vec::new());
        for (doc, is_mixin) in docs.into_iter().zip(is_mixin) {
            if is_mixin {
                mixins.push(doc);
            } else {
                bases.push(doc);
            }
        }

        self.load(bases)?;
        log::debug!("Restoring {} mixin documents...", mixins.len());
        for mixin in mixins {
            self.attach_mixin(mixin)?;
        }
        Ok(())
    }

    /// Insert a single document.
    pub fn add(&mut self, doc: Document) -> Result<(), Error> {
        if self.docs.contains_key(&doc.id) {
            return Err(Error::DuplicateId { id: doc.id });
        }
        log::trace!("Adding {} ({})", doc.id, doc.class);
        self.insert(doc);
        Ok(())
    }

    fn insert(&mut self, doc: Document) {
        self.order.push(doc.id.clone());
        self.docs.insert(doc.id.clone(), Arc::new(doc));
    }

    /// Point lookup.
    pub fn get(&self, id: &DocRef) -> Result<Arc<Document>, Error> {
        self.docs
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound { id: id.clone() })
    }

    /// True if a base document with this id exists.
    pub fn contains(&self, id: &DocRef) -> bool {
        self.docs.contains_key(id)
    }

    /// Linear scan for documents of exactly `class` matching `query`.
    ///
    /// Subclass documents are not included; expand with
    /// [`ModelDb::subclasses`] first when that is wanted. Never fails: no
    /// match is an empty result.
    pub fn find_all(&self, class: &ClassRef, query: &Query) -> Vec<Arc<Document>> {
        self.documents()
            .filter(|doc| &doc.class == class && query.matches(doc))
            .cloned()
            .collect()
    }

    /// All base documents in insertion order.
    pub fn documents(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.order.iter().filter_map(|id| self.docs.get(id))
    }

    /// Attach a mixin document to its base.
    ///
    /// The base's `mixins` set gains `mixin.class`. If the base already
    /// carries this mixin, `mixin.attributes` are merged over the existing
    /// mixin attributes. The base's own attributes are never touched.
    ///
    /// A mixin must be tagged with a class other than the base's own.
    pub fn attach_mixin(&mut self, mixin: Document) -> Result<Arc<Document>, Error> {
        let base = self.get(&mixin.id)?;
        if base.class == mixin.class {
            return Err(Error::invalid(format!(
                "{} cannot be mixed into {}, which already has that class",
                mixin.class, mixin.id
            )));
        }
        if !base.mixins.contains(&mixin.class) {
            let mut updated = (*base).clone();
            updated.mixins.insert(mixin.class.clone());
            self.docs.insert(updated.id.clone(), Arc::new(updated));
        }

        let key = (mixin.id.clone(), mixin.class.clone());
        let stored = match self.mixins.get(&key) {
            Some(existing) => {
                let mut merged = (**existing).clone();
                merged.attributes.extend(mixin.attributes);
                Arc::new(merged)
            }
            None => {
                self.mixin_order.push(key.clone());
                Arc::new(mixin)
            }
        };
        log::debug!("Mixed {} into {}", key.1, key.0);
        self.mixins.insert(key, stored.clone());
        Ok(stored)
    }

    /// The mixin document attached to `id` under `class`.
    pub fn get_mixin(&self, id: &DocRef, class: &ClassRef) -> Result<Arc<Document>, Error> {
        self.mixins
            .get(&(id.clone(), class.clone()))
            .cloned()
            .ok_or_else(|| {
                if self.docs.contains_key(id) {
                    Error::NotMixedIn {
                        id: id.clone(),
                        mixin: class.clone(),
                    }
                } else {
                    Error::NotFound { id: id.clone() }
                }
            })
    }

    /// Mixin documents in attachment order.
    pub fn mixin_documents(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.mixin_order.iter().filter_map(|key| self.mixins.get(key))
    }

    /// Snapshot of every document: base documents first, then mixin documents.
    pub fn dump(&self) -> Vec<Document> {
        self.documents()
            .chain(self.mixin_documents())
            .map(|doc| (**doc).clone())
            .collect()
    }
}
