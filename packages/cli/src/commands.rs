//! Command definitions and execution.
//!
//! Commands:
//! - `classes` - List every class with its parent and domain
//! - `hierarchy <class>` - Print the class chain up to the root
//! - `domain <class>` - Print the storage domain of a class
//! - `attributes <class>` - List resolvable attributes and how they resolve
//! - `get <id> [--raw] [--mixin <class>]` - Print a document as an instance
//! - `find <class> [--where NAME=VALUE]... [--deep]` - Print matching instances
//! - `export <dir>` - Write every document to a JSON domain cache

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Subcommand;
use serde_json::Value as JsonValue;

use docmodel_core::builtin::field;
use docmodel_core::{Class, ClassRef, DocRef, Value};
use docmodel_json_store::{DomainCache, JsonLocalCache};
use docmodel_memdb::Query;
use docmodel_serde::{json_to_value, value_to_json};
use docmodel_session::{Accessor, Exerted, Instance, MixinView, Session};

use crate::CliError;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List every class with its parent and domain
    Classes,

    /// Print the class chain from CLASS up to the root
    Hierarchy { class: String },

    /// Print the storage domain of CLASS
    Domain { class: String },

    /// List the attributes instances of CLASS resolve
    Attributes { class: String },

    /// Print a document through its class's prototype
    Get {
        id: String,

        /// Print the stored document instead
        #[arg(long)]
        raw: bool,

        /// View the document through this mixin
        #[arg(long)]
        mixin: Option<String>,
    },

    /// Print instances of CLASS matching every filter
    Find {
        class: String,

        /// Exact-match filter; VALUE is parsed as JSON, or taken as a string
        #[arg(long = "where", value_name = "NAME=VALUE")]
        filters: Vec<String>,

        /// Include instances of subclasses
        #[arg(long)]
        deep: bool,
    },

    /// Write every document to a JSON domain cache rooted at DIR
    Export { dir: PathBuf },
}

/// Execute a command against a loaded session, returning what to print.
pub fn execute(command: &Command, session: &Session) -> Result<String, CliError> {
    match command {
        Command::Classes => classes(session),
        Command::Hierarchy { class } => {
            let chain = session.get_class_hierarchy(&ClassRef::from(class.as_str()), None)?;
            Ok(chain
                .iter()
                .map(ClassRef::as_str)
                .collect::<Vec<_>>()
                .join(" -> "))
        }
        Command::Domain { class } => Ok(session.get_domain(&ClassRef::from(class.as_str()))?),
        Command::Attributes { class } => attributes(session, &ClassRef::from(class.as_str())),
        Command::Get { id, raw, mixin } => {
            let id = DocRef::from(id.as_str());
            let json = match (raw, mixin) {
                (true, _) => value_to_json(session.get_document(&id)?.to_value()),
                (false, Some(mixin)) => {
                    mixin_json(&session.as_mixin(&id, &ClassRef::from(mixin.as_str()))?)?
                }
                (false, None) => instance_json(&session.get_instance(&id)?)?,
            };
            Ok(serde_json::to_string_pretty(&json)?)
        }
        Command::Find {
            class,
            filters,
            deep,
        } => {
            let class = ClassRef::from(class.as_str());
            let query = parse_query(filters)?;
            let found = if *deep {
                session.find_deep(&class, &query)?
            } else {
                session.find(&class, &query)?
            };
            let items = found
                .iter()
                .map(instance_json)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(serde_json::to_string_pretty(&JsonValue::Array(items))?)
        }
        Command::Export { dir } => {
            let mut cache = JsonLocalCache::new(dir.clone())?;
            session.read(|db| cache.store_all(db))?;
            let domains = cache.domains()?;
            Ok(format!(
                "Exported {} documents to {} ({})",
                session.dump().len(),
                cache.root().display(),
                domains.join(", ")
            ))
        }
    }
}

fn classes(session: &Session) -> Result<String, CliError> {
    session.read(|db| -> Result<String, CliError> {
        let mut lines = Vec::new();
        for doc in db.find_classes(&Query::new())? {
            let extends = Class::extends_of(&doc)?;
            let domain = db.get_domain(&doc.id.as_class_ref()).ok();
            lines.push(format!(
                "{}{}{}",
                doc.id,
                extends.map(|e| format!(" : {}", e)).unwrap_or_default(),
                domain.map(|d| format!(" [{}]", d)).unwrap_or_default()
            ));
        }
        Ok(lines.join("\n"))
    })
}

fn attributes(session: &Session, class: &ClassRef) -> Result<String, CliError> {
    let prototype = session.get_prototype(class)?;
    let lines: Vec<String> = prototype
        .attribute_names()
        .into_iter()
        .map(|name| {
            let how = match prototype.resolve(name) {
                Some(Accessor::Generated(ty)) => ty.class.to_string(),
                Some(Accessor::Native(_)) => "native".to_string(),
                Some(Accessor::Identity) | None => "identity".to_string(),
            };
            format!("{}: {}", name, how)
        })
        .collect();
    Ok(lines.join("\n"))
}

/// `NAME=VALUE` filters as a query.
pub fn parse_query(filters: &[String]) -> Result<Query, CliError> {
    filters.iter().try_fold(Query::new(), |query, filter| {
        let (name, raw) = filter.split_once('=').ok_or_else(|| CliError::InvalidFilter {
            filter: filter.clone(),
        })?;
        if name.is_empty() {
            return Err(CliError::InvalidFilter {
                filter: filter.clone(),
            });
        }
        let value = serde_json::from_str::<JsonValue>(raw)
            .map(json_to_value)
            .unwrap_or_else(|_| Value::from(raw));
        Ok(query.eq(name, value))
    })
}

fn identity_json(
    get: impl Fn(&str) -> Result<Exerted, docmodel_core::Error>,
) -> Result<BTreeMap<String, JsonValue>, CliError> {
    let mut map = BTreeMap::new();
    for name in [field::CLASS, field::ID, field::MIXINS] {
        let value = get(name)?;
        if !value.is_absent() {
            map.insert(name.to_string(), value_to_json(value.to_value()));
        }
    }
    Ok(map)
}

/// An instance with every declared attribute exerted; absent ones omitted.
pub fn instance_json(instance: &Instance) -> Result<JsonValue, CliError> {
    let mut map = identity_json(|name| instance.get(name))?;
    for (name, value) in instance.attributes()? {
        if !value.is_absent() {
            map.insert(name, value_to_json(value.to_value()));
        }
    }
    Ok(JsonValue::Object(map.into_iter().collect()))
}

fn mixin_json(view: &MixinView) -> Result<JsonValue, CliError> {
    let mut map = identity_json(|name| view.get(name))?;
    for name in view.mixin().prototype().attribute_names() {
        let value = view.get(name)?;
        if !value.is_absent() {
            map.insert(name.to_string(), value_to_json(value.to_value()));
        }
    }
    Ok(JsonValue::Object(map.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmodel_core::{builtin, Document, Type};
    use serde_json::json;

    fn session() -> Session {
        let session = Session::default();
        session
            .load_model(vec![
                Class::new(builtin::OBJ).to_document(),
                Class::new(builtin::DOC)
                    .extends(builtin::OBJ)
                    .domain("core")
                    .to_document(),
                Class::new(builtin::CLASS).extends(builtin::DOC).to_document(),
                Class::new("class:task.Task")
                    .extends(builtin::DOC)
                    .attribute("name", Type::primitive())
                    .attribute("priority", Type::primitive().with_default(3i64))
                    .domain("tasks")
                    .to_document(),
                Class::new("class:task.Bug")
                    .extends("class:task.Task")
                    .to_document(),
                Class::new("class:task.Assignable")
                    .extends("class:task.Task")
                    .attribute("assignee", Type::ref_to(builtin::DOC))
                    .to_document(),
                Document::new("class:task.Task", "t1").with("name", "Fix bug"),
                Document::new("class:task.Bug", "b1")
                    .with("name", "Crash")
                    .with("priority", 1i64),
            ])
            .unwrap();
        session
    }

    fn run_json(command: Command, session: &Session) -> JsonValue {
        serde_json::from_str(&execute(&command, session).unwrap()).unwrap()
    }

    #[test]
    fn test_hierarchy() {
        let out = execute(
            &Command::Hierarchy {
                class: "class:task.Bug".to_string(),
            },
            &session(),
        )
        .unwrap();
        assert_eq!(
            out,
            "class:task.Bug -> class:task.Task -> class:core.Doc -> class:core.Obj"
        );
    }

    #[test]
    fn test_domain() {
        let session = session();
        let domain = |class: &str| {
            execute(
                &Command::Domain {
                    class: class.to_string(),
                },
                &session,
            )
        };
        assert_eq!(domain("class:task.Bug").unwrap(), "tasks");
        assert!(matches!(
            domain(builtin::OBJ),
            Err(CliError::Model(docmodel_core::Error::DomainNotFound { .. }))
        ));
    }

    #[test]
    fn test_classes_lists_parent_and_domain() {
        let out = execute(&Command::Classes, &session()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "class:core.Obj");
        assert!(lines.contains(&"class:task.Bug : class:task.Task [tasks]"));
    }

    #[test]
    fn test_attributes() {
        let out = execute(
            &Command::Attributes {
                class: "class:task.Bug".to_string(),
            },
            &session(),
        )
        .unwrap();
        assert_eq!(out, "name: class:core.Type\npriority: class:core.Type");
    }

    #[test]
    fn test_get_exerts_defaults() {
        let out = run_json(
            Command::Get {
                id: "t1".to_string(),
                raw: false,
                mixin: None,
            },
            &session(),
        );
        assert_eq!(
            out,
            json!({"_class": "class:task.Task", "_id": "t1", "name": "Fix bug", "priority": 3})
        );
    }

    #[test]
    fn test_get_raw() {
        let out = run_json(
            Command::Get {
                id: "t1".to_string(),
                raw: true,
                mixin: None,
            },
            &session(),
        );
        assert_eq!(out, json!({"_class": "class:task.Task", "_id": "t1", "name": "Fix bug"}));
    }

    #[test]
    fn test_get_through_mixin() {
        let session = session();
        let mut values = BTreeMap::new();
        values.insert("assignee".to_string(), Value::from("user1"));
        session
            .mixin(&DocRef::from("t1"), &ClassRef::from("class:task.Assignable"), values)
            .unwrap();

        let out = run_json(
            Command::Get {
                id: "t1".to_string(),
                raw: false,
                mixin: Some("class:task.Assignable".to_string()),
            },
            &session,
        );
        assert_eq!(out["_class"], "class:task.Assignable");
        assert_eq!(out["assignee"], "user1");
        assert_eq!(out["name"], "Fix bug");
        assert_eq!(out["_mixins"], json!(["class:task.Assignable"]));
    }

    #[test]
    fn test_find_exact_and_deep() {
        let session = session();
        let find = |deep: bool| {
            run_json(
                Command::Find {
                    class: "class:task.Task".to_string(),
                    filters: vec![],
                    deep,
                },
                &session,
            )
        };
        assert_eq!(find(false).as_array().unwrap().len(), 1);
        assert_eq!(find(true).as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_query() {
        let query = parse_query(&["priority=1".to_string(), "name=Crash".to_string()]).unwrap();
        let fields: Vec<_> = query.fields().collect();
        assert_eq!(
            fields,
            vec![("name", &Value::from("Crash")), ("priority", &Value::from(1i64))]
        );
        assert!(matches!(
            parse_query(&["nonsense".to_string()]),
            Err(CliError::InvalidFilter { .. })
        ));
        assert!(matches!(
            parse_query(&["=1".to_string()]),
            Err(CliError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_find_with_filter() {
        let out = run_json(
            Command::Find {
                class: "class:task.Bug".to_string(),
                filters: vec!["priority=1".to_string()],
                deep: false,
            },
            &session(),
        );
        assert_eq!(out[0]["_id"], "b1");
    }

    #[test]
    fn test_export_writes_domains() {
        let dir = tempfile::tempdir().unwrap();
        let out = execute(
            &Command::Export {
                dir: dir.path().to_path_buf(),
            },
            &session(),
        )
        .unwrap();
        assert!(out.contains("core, tasks"));
        assert!(dir.path().join("tasks").join("b1.json").is_file());
    }
}
