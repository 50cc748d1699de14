//! Typed reads and writes of instances via serde.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use docmodel_core::builtin::{self, field};
use docmodel_core::{ClassRef, DocRef, Document, Value};
use docmodel_session::{Exerted, Instance, Session};

use crate::convert::{from_value, to_value};
use crate::Error;

/// Extension trait for reading instances into Rust types.
///
/// The instance's declared attributes are exerted, absent ones are left out,
/// and the result is deserialized together with `_class` and `_id`.
///
/// # Example
///
/// ```rust
/// use docmodel_core::{builtin, Class, Document, Type};
/// use docmodel_serde::TypedInstance;
/// use docmodel_session::Session;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Task {
///     name: String,
/// }
///
/// let session = Session::default();
/// session.load_model(vec![
///     Class::new(builtin::OBJ).to_document(),
///     Class::new("class:task.Task")
///         .extends(builtin::OBJ)
///         .attribute("name", Type::primitive())
///         .to_document(),
///     Document::new("class:task.Task", "t1").with("name", "Fix bug"),
/// ]).unwrap();
///
/// let task: Task = session.get_instance(&"t1".into()).unwrap().read_as().unwrap();
/// assert_eq!(task.name, "Fix bug");
/// ```
pub trait TypedInstance {
    fn read_as<T: DeserializeOwned>(&self) -> Result<T, Error>;

    /// A single exerted attribute; `None` when absent.
    fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, Error>;
}

impl TypedInstance for Instance {
    fn read_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let mut map: BTreeMap<String, Value> = self
            .attributes()?
            .into_iter()
            .filter(|(_, v)| !v.is_absent())
            .map(|(k, v)| (k, v.to_value()))
            .collect();
        map.insert(field::CLASS.to_string(), Value::from(self.class().as_str()));
        if let Some(id) = self.id() {
            map.insert(field::ID.to_string(), Value::from(id.as_str()));
        }
        from_value(Value::Map(map))
    }

    fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, Error> {
        match self.get(name)? {
            Exerted::Absent => Ok(None),
            exerted => from_value(exerted.to_value()).map(Some),
        }
    }
}

/// Extension trait for storing and fetching Rust types through a session.
pub trait TypedSession {
    /// Serialize `data` and store it as a new document of `class`.
    ///
    /// `data` must serialize to a map; housekeeping fields in it are dropped.
    fn create_as<T: Serialize>(
        &self,
        class: &ClassRef,
        data: &T,
        id: Option<DocRef>,
    ) -> Result<Document, Error>;

    fn get_instance_as<T: DeserializeOwned>(&self, id: &DocRef) -> Result<T, Error>;
}

impl TypedSession for Session {
    fn create_as<T: Serialize>(
        &self,
        class: &ClassRef,
        data: &T,
        id: Option<DocRef>,
    ) -> Result<Document, Error> {
        let Value::Map(mut attributes) = to_value(data)? else {
            return Err(Error::malformed(format!(
                "a {} document must serialize to a map",
                class
            )));
        };
        attributes.retain(|name, _| !builtin::is_reserved(name));
        Ok(self.create_document(class, attributes, id)?)
    }

    fn get_instance_as<T: DeserializeOwned>(&self, id: &DocRef) -> Result<T, Error> {
        self.get_instance(id)?.read_as()
    }
}
