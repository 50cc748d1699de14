use std::{fs, io, path};

use docmodel_core::Document;
use docmodel_memdb::ModelDb;
use docmodel_serde::{document_from_json, document_to_json};

use crate::cache::{placements, DomainCache};
use crate::CacheError;

const EXTENSION: &str = "json";

/// A domain cache on local disk: one JSON file per document.
///
/// Layout is `<root>/<domain>/<entry name>.json`, where the entry name is the
/// document id, or `<id>@<mixin class>` for a mixin document. Characters that
/// some filesystems refuse (`:` in every class id, among others) are written
/// as `%XX`, so `class:task.Task` lands in `class%3Atask.Task.json`. Documents
/// carry their own ids, so file names are never decoded.
pub struct JsonLocalCache {
    root: path::PathBuf,
}

impl JsonLocalCache {
    /// Open a cache rooted at an existing, writable directory.
    pub fn new(root: path::PathBuf) -> Result<JsonLocalCache, CacheError> {
        let attr = fs::metadata(&root).map_err(|error| CacheError::RootPathInvalid {
            path: root.clone(),
            error,
        })?;

        if !attr.is_dir() {
            return Err(CacheError::RootPathInvalid {
                path: root,
                error: io::Error::other("Root path must be a directory."),
            });
        }

        if attr.permissions().readonly() {
            return Err(CacheError::RootPathInvalid {
                path: root,
                error: io::Error::other("Root directory must be writable"),
            });
        }

        match root.canonicalize() {
            Ok(root) => Ok(JsonLocalCache { root }),
            Err(error) => Err(CacheError::RootPathInvalid { path: root, error }),
        }
    }

    pub fn root(&self) -> &path::Path {
        &self.root
    }

    fn domain_dir(&self, domain: &str) -> Result<path::PathBuf, CacheError> {
        Ok(self.root.join(file_stem(checked_name(domain)?)))
    }

    fn entry_path(&self, domain: &str, name: &str) -> Result<path::PathBuf, CacheError> {
        let mut file_path = self.domain_dir(domain)?.join(file_stem(checked_name(name)?));
        file_path.as_mut_os_string().push(".");
        file_path.as_mut_os_string().push(EXTENSION);
        Ok(file_path)
    }

    fn write_document(&self, file_path: &path::Path, doc: &Document) -> Result<(), CacheError> {
        log::debug!("Writing {}...", file_path.display());
        let file = fs::File::create(file_path).map_err(|e| CacheError::io(file_path, e))?;
        let mut writer = io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &document_to_json(doc))?;
        io::Write::flush(&mut writer).map_err(|e| CacheError::io(file_path, e))?;
        Ok(())
    }

    fn read_document(&self, file_path: &path::Path) -> Result<Document, CacheError> {
        log::debug!("Reading {}...", file_path.display());
        let file = fs::File::open(file_path).map_err(|e| CacheError::io(file_path, e))?;
        let json: serde_json::Value = serde_json::from_reader(io::BufReader::new(file))?;
        Ok(document_from_json(json)?)
    }
}

impl DomainCache for JsonLocalCache {
    fn store(&mut self, db: &ModelDb, docs: &[Document]) -> Result<(), CacheError> {
        let placements = placements(db, docs)?;
        let targets = placements
            .iter()
            .map(|(domain, name)| self.entry_path(domain, name))
            .collect::<Result<Vec<_>, _>>()?;

        for (file_path, doc) in targets.iter().zip(docs) {
            if let Some(dir) = file_path.parent() {
                fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;
            }
            self.write_document(file_path, doc)?;
        }
        Ok(())
    }

    fn load_domain(&self, domain: &str) -> Result<Vec<Document>, CacheError> {
        let dir = self.domain_dir(domain)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        // Sorted by file name, `<id>.json` comes before `<id>@...`.
        let mut docs = Vec::new();
        for entry in walkdir::WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| walk_error(&dir, e))?;
            let file_path = entry.path();
            let is_json = file_path
                .extension()
                .is_some_and(|ext| ext == EXTENSION);
            if entry.file_type().is_file() && is_json {
                docs.push(self.read_document(file_path)?);
            }
        }
        Ok(docs)
    }

    fn domains(&self) -> Result<Vec<String>, CacheError> {
        let mut domains = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| walk_error(&self.root, e))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                domains.push(name_from_stem(name));
            }
        }
        Ok(domains)
    }
}

/// Escape characters that are not portable in file names.
fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '%' | '<' | '>' | ':' | '"' | '|' | '?' | '*') || c.is_ascii_control() {
            stem.push_str(&format!("%{:02X}", c as u32));
        } else {
            stem.push(c);
        }
    }
    stem
}

/// Undo [`file_stem`].
fn name_from_stem(stem: &str) -> String {
    let mut name = String::with_capacity(stem.len());
    let mut rest = stem;
    while let Some(at) = rest.find('%') {
        name.push_str(&rest[..at]);
        let escaped = rest
            .get(at + 1..at + 3)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(byte) => {
                name.push(char::from(byte));
                rest = &rest[at + 3..];
            }
            None => {
                name.push('%');
                rest = &rest[at + 1..];
            }
        }
    }
    name.push_str(rest);
    name
}

fn walk_error(dir: &path::Path, error: walkdir::Error) -> CacheError {
    let path = error.path().unwrap_or(dir).to_path_buf();
    CacheError::Io {
        path,
        error: io::Error::from(error),
    }
}

/// Reject names that would escape or alias a directory.
fn checked_name(name: &str) -> Result<&str, CacheError> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0']);
    if bad {
        Err(CacheError::InvalidName {
            name: name.to_string(),
        })
    } else {
        Ok(name)
    }
}

#[cfg(test)]
mod json_local_cache_tests {
    use super::*;
    use docmodel_core::{builtin, Class, ClassRef, DocRef, Value};

    fn db() -> ModelDb {
        let mut db = ModelDb::new();
        db.load(vec![
            Class::new(builtin::OBJ).to_document(),
            Class::new(builtin::DOC)
                .extends(builtin::OBJ)
                .domain("core")
                .to_document(),
            Class::new(builtin::CLASS).extends(builtin::DOC).to_document(),
            Class::new("class:task.Task")
                .extends(builtin::DOC)
                .domain("tasks")
                .to_document(),
            Class::new("class:task.Assignable")
                .extends("class:task.Task")
                .domain("assignments")
                .to_document(),
            Document::new("class:task.Task", "t1")
                .with("name", "Fix bug")
                .with("tags", vec!["a", "b"]),
            Document::new("class:task.Task", "t2").with("name", "Docs"),
        ])
        .unwrap();
        db.attach_mixin(Document::new("class:task.Assignable", "t1").with("assignee", "user1"))
            .unwrap();
        db
    }

    #[test]
    fn rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            JsonLocalCache::new(missing),
            Err(CacheError::RootPathInvalid { .. })
        ));
    }

    #[test]
    fn rejects_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"{}").unwrap();
        assert!(matches!(
            JsonLocalCache::new(file),
            Err(CacheError::RootPathInvalid { .. })
        ));
    }

    #[test]
    fn writes_one_file_per_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = JsonLocalCache::new(path::PathBuf::from(dir.path())).unwrap();
        let db = db();
        cache.store_all(&db).unwrap();

        let root = cache.root();
        assert!(root.join("tasks").join("t1.json").is_file());
        assert!(root.join("tasks").join("t2.json").is_file());
        assert!(root
            .join("assignments")
            .join("t1@class%3Atask.Assignable.json")
            .is_file());
        assert!(root.join("core").join("class%3Atask.Task.json").is_file());
        assert_eq!(cache.domains().unwrap(), vec!["assignments", "core", "tasks"]);
    }

    #[test]
    fn round_trips_a_domain() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = JsonLocalCache::new(path::PathBuf::from(dir.path())).unwrap();
        let db = db();
        cache.store_all(&db).unwrap();

        let tasks = cache.load_domain("tasks").unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0], *db.get(&DocRef::from("t1")).unwrap());
        assert_eq!(tasks[0].attribute("tags"), Some(&Value::from(vec!["a", "b"])));

        let found = cache
            .find(&db, &ClassRef::from("class:task.Assignable"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].attribute("assignee"), Some(&Value::from("user1")));
    }

    #[test]
    fn load_all_restores_mixins() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = JsonLocalCache::new(path::PathBuf::from(dir.path())).unwrap();
        let db = db();
        cache.store_all(&db).unwrap();

        let mut restored = ModelDb::new();
        restored.restore(cache.load_all().unwrap()).unwrap();
        assert_eq!(restored.len(), db.len());
        assert!(restored
            .get_mixin(&DocRef::from("t1"), &ClassRef::from("class:task.Assignable"))
            .is_ok());
    }

    #[test]
    fn file_names_are_portable() {
        assert_eq!(file_stem("t1"), "t1");
        assert_eq!(file_stem("t1@class:task.Assignable"), "t1@class%3Atask.Assignable");
        assert_eq!(file_stem("50%"), "50%25");
        assert_eq!(file_stem("a|b?"), "a%7Cb%3F");
        assert_eq!(name_from_stem("t1@class%3Atask.Assignable"), "t1@class:task.Assignable");
        assert_eq!(name_from_stem("50%25"), "50%");
    }

    #[test]
    fn domain_names_round_trip_through_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = JsonLocalCache::new(path::PathBuf::from(dir.path())).unwrap();
        let mut db = db();
        db.add(
            Class::new("class:ui.Widget")
                .extends(builtin::DOC)
                .domain("ui:widgets")
                .to_document(),
        )
        .unwrap();
        db.add(Document::new("class:ui.Widget", "w1")).unwrap();
        cache.store_all(&db).unwrap();

        assert!(cache.root().join("ui%3Awidgets").join("w1.json").is_file());
        assert!(cache.domains().unwrap().contains(&"ui:widgets".to_string()));
        assert_eq!(cache.load_domain("ui:widgets").unwrap().len(), 1);
    }

    #[test]
    fn vanished_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");
        fs::create_dir(&root).unwrap();
        let cache = JsonLocalCache::new(root.clone()).unwrap();
        fs::remove_dir(&root).unwrap();
        assert!(matches!(cache.domains(), Err(CacheError::Io { .. })));
    }

    #[test]
    fn unknown_domain_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonLocalCache::new(path::PathBuf::from(dir.path())).unwrap();
        assert!(cache.load_domain("nothing").unwrap().is_empty());
    }

    #[test]
    fn rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = JsonLocalCache::new(path::PathBuf::from(dir.path())).unwrap();
        let db = db();
        let err = cache
            .store(&db, &[Document::new("class:task.Task", "../escape")])
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidName { .. }));
        assert!(cache.load_domain("tasks").unwrap().is_empty());
    }
}
