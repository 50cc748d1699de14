//! Raw documents and embedded objects.
//!
//! Serialized form is a flat map: the reserved `_class`, `_id` and `_mixins`
//! fields sit next to the attributes.
//!
//! ```json
//! {"_class": "class:task.Task", "_id": "t1", "name": "Fix bug"}
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::builtin::field;
use crate::{ClassRef, DocRef, Error, Value};

/// A stored, class-tagged record.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub class: ClassRef,
    pub id: DocRef,
    /// Mixin classes attached to this document.
    pub mixins: BTreeSet<ClassRef>,
    /// Everything except the three identity fields.
    pub attributes: BTreeMap<String, Value>,
}

impl Document {
    /// Create a document with no attributes.
    pub fn new(class: impl Into<ClassRef>, id: impl Into<DocRef>) -> Self {
        Self {
            class: class.into(),
            id: id.into(),
            mixins: BTreeSet::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder-style attribute map setter; replaces existing attributes.
    pub fn with_attributes(mut self, attributes: BTreeMap<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Raw stored value of an attribute. `None` means absent.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Render the document in its flat serialized form.
    pub fn to_value(&self) -> Value {
        let mut map = self.attributes.clone();
        map.insert(field::CLASS.to_string(), Value::from(self.class.as_str()));
        map.insert(field::ID.to_string(), Value::from(self.id.as_str()));
        if !self.mixins.is_empty() {
            map.insert(
                field::MIXINS.to_string(),
                Value::Array(self.mixins.iter().map(|m| Value::from(m.as_str())).collect()),
            );
        }
        Value::Map(map)
    }

    /// Parse a document from its flat serialized form.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let map = value
            .as_map()
            .ok_or_else(|| Error::invalid(format!("document must be a map, got {}", value.kind())))?;
        let class = required_str(map, field::CLASS)?;
        let id = required_str(map, field::ID)?;

        let mixins = match map.get(field::MIXINS) {
            None | Some(Value::Null) => BTreeSet::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(ClassRef::from).ok_or_else(|| {
                        Error::invalid(format!("{}: _mixins entries must be strings", id))
                    })
                })
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(Error::invalid(format!(
                    "{}: _mixins must be an array, got {}",
                    id,
                    other.kind()
                )))
            }
        };

        let attributes = map
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), field::CLASS | field::ID | field::MIXINS))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            class: ClassRef::from(class),
            id: DocRef::from(id),
            mixins,
            attributes,
        })
    }
}

/// An embedded object: a nested record with a class tag but no store entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Obj {
    pub class: ClassRef,
    pub attributes: BTreeMap<String, Value>,
}

impl Obj {
    pub fn new(class: impl Into<ClassRef>) -> Self {
        Self {
            class: class.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.attributes.clone();
        map.insert(field::CLASS.to_string(), Value::from(self.class.as_str()));
        Value::Map(map)
    }

    /// Parse an embedded object.
    ///
    /// When the map carries no `_class`, `fallback` is used as the class. This
    /// is how `InstanceOf` values without their own tag get bound to the
    /// declared target class.
    pub fn from_value(value: &Value, fallback: Option<&ClassRef>) -> Result<Self, Error> {
        let map = value
            .as_map()
            .ok_or_else(|| Error::invalid(format!("object must be a map, got {}", value.kind())))?;
        let class = match (map.get(field::CLASS), fallback) {
            (Some(Value::String(s)), _) => ClassRef::from(s.as_str()),
            (None, Some(fallback)) => fallback.clone(),
            (Some(other), _) => {
                return Err(Error::invalid(format!(
                    "_class must be a string, got {}",
                    other.kind()
                )))
            }
            (None, None) => return Err(Error::invalid("object is missing _class")),
        };
        let attributes = map
            .iter()
            .filter(|(k, _)| k.as_str() != field::CLASS)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self { class, attributes })
    }
}

fn required_str<'a>(map: &'a BTreeMap<String, Value>, name: &str) -> Result<&'a str, Error> {
    match map.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(Error::invalid(format!(
            "{} must be a string, got {}",
            name,
            other.kind()
        ))),
        None => Err(Error::invalid(format!("missing {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    #[test]
    fn document_to_value_is_flat() {
        let doc = Document::new("class:task.Task", "t1").with("name", "Fix bug");
        let value = doc.to_value();
        assert_eq!(value.field("_class"), Some(&Value::from("class:task.Task")));
        assert_eq!(value.field("_id"), Some(&Value::from("t1")));
        assert_eq!(value.field("name"), Some(&Value::from("Fix bug")));
        assert_eq!(value.field("_mixins"), None);
    }

    #[test]
    fn document_parses_back() {
        let mut doc = Document::new("class:task.Task", "t1").with("done", false);
        doc.mixins.insert(ClassRef::from("class:task.Assignable"));
        let parsed = Document::from_value(&doc.to_value()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn document_missing_id_is_invalid() {
        let value = Value::Map(btree! {
            "_class".to_string() => Value::from("class:task.Task"),
        });
        let err = Document::from_value(&value).unwrap_err();
        assert_eq!(err, Error::invalid("missing _id"));
    }

    #[test]
    fn document_rejects_non_map() {
        assert!(Document::from_value(&Value::from("t1")).is_err());
    }

    #[test]
    fn document_rejects_bad_mixins() {
        let value = Value::Map(btree! {
            "_class".to_string() => Value::from("class:task.Task"),
            "_id".to_string() => Value::from("t1"),
            "_mixins".to_string() => Value::from("oops"),
        });
        assert!(matches!(
            Document::from_value(&value),
            Err(Error::InvalidDocument { .. })
        ));
    }

    #[test]
    fn obj_uses_fallback_class() {
        let value = Value::Map(btree! {
            "street".to_string() => Value::from("Main"),
        });
        let obj = Obj::from_value(&value, Some(&ClassRef::from("class:crm.Address"))).unwrap();
        assert_eq!(obj.class, "class:crm.Address");
        assert_eq!(obj.attribute("street"), Some(&Value::from("Main")));
        assert!(Obj::from_value(&value, None).is_err());
    }

    #[test]
    fn obj_own_class_wins_over_fallback() {
        let obj = Obj::new("class:crm.Home").with("street", "Main");
        let parsed = Obj::from_value(&obj.to_value(), Some(&ClassRef::from("class:crm.Address")))
            .unwrap();
        assert_eq!(parsed, obj);
    }
}
