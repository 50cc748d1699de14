//! The persistence collaborator contract.

use docmodel_core::{ClassRef, Document};
use docmodel_memdb::ModelDb;

use crate::CacheError;

/// Separates a mixin document's base id from its mixin class in entry names.
pub const MIXIN_SEPARATOR: char = '@';

/// A cache of documents partitioned by storage domain.
///
/// Each document lands in the domain its class (or nearest ancestor)
/// declares. Within a domain, entries are keyed by [`entry_name`], so storing
/// a document again replaces the earlier copy.
pub trait DomainCache {
    /// Persist `docs`, each under its class's domain.
    ///
    /// Every domain is resolved before anything is written; a class without
    /// a domain fails the whole call.
    fn store(&mut self, db: &ModelDb, docs: &[Document]) -> Result<(), CacheError>;

    /// Every document stored under `domain`, bases before their mixins.
    /// An unknown domain is empty.
    fn load_domain(&self, domain: &str) -> Result<Vec<Document>, CacheError>;

    /// Names of the domains holding at least one document, sorted.
    fn domains(&self) -> Result<Vec<String>, CacheError>;

    /// Documents of exactly `class`, looked up in that class's domain.
    fn find(&self, db: &ModelDb, class: &ClassRef) -> Result<Vec<Document>, CacheError> {
        let domain = db.get_domain(class)?;
        Ok(self
            .load_domain(&domain)?
            .into_iter()
            .filter(|doc| &doc.class == class)
            .collect())
    }

    /// Persist every document in `db`, mixins included.
    fn store_all(&mut self, db: &ModelDb) -> Result<(), CacheError> {
        self.store(db, &db.dump())
    }

    /// Every document in every domain, in a form `ModelDb::restore` accepts.
    fn load_all(&self) -> Result<Vec<Document>, CacheError> {
        let mut all = Vec::new();
        for domain in self.domains()? {
            all.extend(self.load_domain(&domain)?);
        }
        Ok(all)
    }
}

/// The key a document is stored under within its domain.
///
/// A base document is keyed by its id. A mixin document shares its base's
/// id, so it is keyed by `<id>@<mixin class>`.
pub fn entry_name(db: &ModelDb, doc: &Document) -> String {
    let is_mixin = db
        .get(&doc.id)
        .map(|base| base.class != doc.class && base.mixins.contains(&doc.class))
        .unwrap_or(false);
    if is_mixin {
        format!("{}{}{}", doc.id, MIXIN_SEPARATOR, doc.class)
    } else {
        doc.id.to_string()
    }
}

/// Resolve the `(domain, entry name)` of every document up front.
pub(crate) fn placements(
    db: &ModelDb,
    docs: &[Document],
) -> Result<Vec<(String, String)>, CacheError> {
    docs.iter()
        .map(|doc| Ok((db.get_domain(&doc.class)?, entry_name(db, doc))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmodel_core::{builtin, Class};

    fn db() -> ModelDb {
        let mut db = ModelDb::new();
        db.load(vec![
            Class::new(builtin::OBJ).to_document(),
            Class::new("class:task.Task")
                .extends(builtin::OBJ)
                .domain("tasks")
                .to_document(),
            Class::new("class:task.Assignable")
                .extends("class:task.Task")
                .domain("assignments")
                .to_document(),
            Document::new("class:task.Task", "t1"),
        ])
        .unwrap();
        db.attach_mixin(Document::new("class:task.Assignable", "t1"))
            .unwrap();
        db
    }

    #[test]
    fn base_entry_is_the_id() {
        let db = db();
        let base = db.get(&"t1".into()).unwrap();
        assert_eq!(entry_name(&db, &base), "t1");
    }

    #[test]
    fn mixin_entry_carries_the_class() {
        let db = db();
        let mixin = db
            .get_mixin(&"t1".into(), &"class:task.Assignable".into())
            .unwrap();
        assert_eq!(entry_name(&db, &mixin), "t1@class:task.Assignable");
    }

    #[test]
    fn placements_fail_without_domain() {
        let db = db();
        let docs = vec![
            Document::new("class:task.Task", "t2"),
            Document::new(builtin::OBJ, "o1"),
        ];
        assert!(matches!(
            placements(&db, &docs),
            Err(CacheError::Model(docmodel_core::Error::DomainNotFound { .. }))
        ));
    }
}
