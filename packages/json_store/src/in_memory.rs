//! In-memory domain cache.

use std::collections::BTreeMap;

use docmodel_core::Document;
use docmodel_memdb::ModelDb;

use crate::cache::{placements, DomainCache};
use crate::CacheError;

/// A domain cache held in memory; mostly useful in tests and as a staging
/// area before writing to disk.
///
/// # Example
///
/// ```rust
/// use docmodel_core::{builtin, Class, Document};
/// use docmodel_json_store::{DomainCache, InMemoryCache};
/// use docmodel_memdb::ModelDb;
///
/// let mut db = ModelDb::new();
/// db.load(vec![
///     Class::new(builtin::OBJ).domain("core").to_document(),
///     Class::new(builtin::CLASS).extends(builtin::OBJ).to_document(),
///     Document::new(builtin::OBJ, "o1"),
/// ]).unwrap();
///
/// let mut cache = InMemoryCache::new();
/// cache.store_all(&db).unwrap();
/// assert_eq!(cache.load_domain("core").unwrap().len(), 3);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryCache {
    /// Domain → entries in first-stored order.
    domains: BTreeMap<String, Vec<(String, Document)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored entries across domains.
    pub fn len(&self) -> usize {
        self.domains.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DomainCache for InMemoryCache {
    fn store(&mut self, db: &ModelDb, docs: &[Document]) -> Result<(), CacheError> {
        let placements = placements(db, docs)?;
        for ((domain, name), doc) in placements.into_iter().zip(docs) {
            log::trace!("Caching {} in {}", name, domain);
            let entries = self.domains.entry(domain).or_default();
            match entries.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, slot)) => *slot = doc.clone(),
                None => entries.push((name, doc.clone())),
            }
        }
        Ok(())
    }

    fn load_domain(&self, domain: &str) -> Result<Vec<Document>, CacheError> {
        Ok(self
            .domains
            .get(domain)
            .map(|entries| entries.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default())
    }

    fn domains(&self) -> Result<Vec<String>, CacheError> {
        Ok(self
            .domains
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(domain, _)| domain.clone())
            .collect())
    }
}
