//! Instances: documents viewed through their class's prototype.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use docmodel_core::builtin::{self, field};
use docmodel_core::{ClassRef, DocRef, Document, Error, Obj, Value};

use crate::exert::exert;
use crate::prototype::{Accessor, Prototype};
use crate::{Exerted, Session};

/// The raw data an instance is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// A stored document.
    Doc(Arc<Document>),
    /// An embedded object reached through an `InstanceOf` attribute.
    Emb(Arc<Obj>),
}

impl Layout {
    pub fn class(&self) -> &ClassRef {
        match self {
            Layout::Doc(doc) => &doc.class,
            Layout::Emb(obj) => &obj.class,
        }
    }

    pub fn id(&self) -> Option<&DocRef> {
        match self {
            Layout::Doc(doc) => Some(&doc.id),
            Layout::Emb(_) => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        match self {
            Layout::Doc(doc) => doc.attribute(name),
            Layout::Emb(obj) => obj.attribute(name),
        }
    }

    /// Raw value of a housekeeping field, including the identity fields
    /// that are not stored among the attributes.
    pub fn identity(&self, name: &str) -> Option<Value> {
        match (name, self) {
            (field::CLASS, _) => Some(Value::from(self.class().as_str())),
            (field::ID, _) => self.id().map(|id| Value::from(id.as_str())),
            (field::MIXINS, Layout::Doc(doc)) if !doc.mixins.is_empty() => Some(Value::Array(
                doc.mixins.iter().map(|m| Value::from(m.as_str())).collect(),
            )),
            (field::MIXINS, _) => None,
            _ => self.attribute(name).cloned(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Layout::Doc(doc) => doc.to_value(),
            Layout::Emb(obj) => obj.to_value(),
        }
    }
}

/// A live, attribute-resolving view of a document.
///
/// Instances are never cached: each access path builds a fresh one, so a
/// document rewritten between accesses is never seen stale. Building one is
/// an `Arc` clone of the layout and of the (memoized) prototype.
///
/// # Example
///
/// ```rust
/// use docmodel_core::{builtin, Class, Document, Type};
/// use docmodel_session::Session;
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
/// let task = session.get_instance(&"t1".into()).unwrap();
/// assert_eq!(task.get("name").unwrap().as_str(), Some("Fix bug"));
/// ```
#[derive(Clone)]
pub struct Instance {
    layout: Layout,
    prototype: Arc<Prototype>,
    session: Session,
}

impl Instance {
    pub(crate) fn new(layout: Layout, prototype: Arc<Prototype>, session: Session) -> Self {
        Self {
            layout,
            prototype,
            session,
        }
    }

    pub fn class(&self) -> &ClassRef {
        self.layout.class()
    }

    /// Document id; `None` for embedded objects.
    pub fn id(&self) -> Option<&DocRef> {
        self.layout.id()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The bound document, when this is not an embedded object.
    pub fn document(&self) -> Option<&Arc<Document>> {
        match &self.layout {
            Layout::Doc(doc) => Some(doc),
            Layout::Emb(_) => None,
        }
    }

    pub fn prototype(&self) -> &Arc<Prototype> {
        &self.prototype
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Raw stored value, without exertion.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.layout.attribute(name)
    }

    /// Read an attribute.
    ///
    /// Housekeeping fields (`_class`, `_id`, `_mixins` and anything else
    /// starting with `_`) pass through raw. Everything else goes through the
    /// prototype chain; a name no class in the chain declares fails with
    /// `UnknownAttribute`.
    pub fn get(&self, name: &str) -> Result<Exerted, Error> {
        if builtin::is_reserved(name) {
            return Ok(self.identity(name));
        }
        match self.prototype.resolve(name) {
            Some(Accessor::Generated(ty)) => exert(ty, self.raw(name), name, &self.session),
            Some(Accessor::Native(f)) => f(self),
            Some(Accessor::Identity) => Ok(self.identity(name)),
            None => Err(Error::UnknownAttribute {
                class: self.class().clone(),
                name: name.to_string(),
            }),
        }
    }

    fn identity(&self, name: &str) -> Exerted {
        self.layout
            .identity(name)
            .map(Exerted::Value)
            .unwrap_or(Exerted::Absent)
    }

    /// Every declared attribute, exerted.
    pub fn attributes(&self) -> Result<BTreeMap<String, Exerted>, Error> {
        self.prototype
            .attribute_names()
            .into_iter()
            .map(|name| self.get(name).map(|v| (name.to_string(), v)))
            .collect()
    }

    /// The class document of this instance, itself as an instance.
    pub fn class_instance(&self) -> Result<Instance, Error> {
        self.session.get_instance(&self.class().as_doc_ref())
    }

    /// True if this instance's class is `class` or derives from it.
    pub fn is(&self, class: &ClassRef) -> Result<bool, Error> {
        self.session.is(self.class(), class)
    }

    /// The raw layout in flat serialized form.
    pub fn to_value(&self) -> Value {
        self.layout.to_value()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.layout == other.layout && Arc::ptr_eq(&self.prototype, &other.prototype)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", self.class())
            .field("id", &self.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryMetadata, NativeImpl};
    use docmodel_core::{Class, Type};

    fn session() -> Session {
        let metadata = Arc::new(InMemoryMetadata::new());
        metadata.set_metadata("asset:task.Icon", "/img/task.svg");
        metadata.set_native(
            "native:task.Task",
            NativeImpl::new().method("title", |inst: &Instance| {
                let name = inst.get("name")?;
                Ok(Exerted::Value(Value::from(format!(
                    "Task: {}",
                    name.as_str().unwrap_or("?")
                ))))
            }),
        );
        let session = Session::new(metadata);
        session
            .load_model(vec![
                Class::new(builtin::OBJ).to_document(),
                Class::new(builtin::DOC).extends(builtin::OBJ).to_document(),
                Class::new(builtin::CLASS).extends(builtin::DOC).to_document(),
                Class::new("class:crm.Address")
                    .extends(builtin::OBJ)
                    .attribute("street", Type::primitive())
                    .attribute("city", Type::primitive().with_default("Nowhere"))
                    .to_document(),
                Class::new("class:task.Task")
                    .extends(builtin::DOC)
                    .attribute("name", Type::primitive())
                    .attribute("icon", Type::metadata(Some("asset:task.Icon")))
                    .attribute("location", Type::instance_of("class:crm.Address"))
                    .attribute("stops", Type::array_of(Type::instance_of("class:crm.Address")))
                    .attribute("owner", Type::ref_to(builtin::DOC))
                    .native("native:task.Task")
                    .to_document(),
                Document::new("class:task.Task", "t1")
                    .with("name", "Fix bug")
                    .with("icon", "asset:task.Icon")
                    .with("owner", "u1")
                    .with(
                        "location",
                        Obj::new("class:crm.Address").with("street", "Main").to_value(),
                    )
                    .with(
                        "stops",
                        vec![
                            Obj::new("class:crm.Address").with("street", "A").to_value(),
                            Obj::new("class:crm.Address").with("street", "B").to_value(),
                        ],
                    ),
            ])
            .unwrap();
        session
    }

    #[test]
    fn identity_fields_pass_through() {
        let task = session().get_instance(&DocRef::from("t1")).unwrap();
        assert_eq!(task.get("_class").unwrap().as_str(), Some("class:task.Task"));
        assert_eq!(task.get("_id").unwrap().as_str(), Some("t1"));
        assert!(task.get("_mixins").unwrap().is_absent());
    }

    #[test]
    fn unknown_attribute_fails() {
        let task = session().get_instance(&DocRef::from("t1")).unwrap();
        assert_eq!(
            task.get("nope"),
            Err(Error::UnknownAttribute {
                class: ClassRef::from("class:task.Task"),
                name: "nope".to_string()
            })
        );
    }

    #[test]
    fn embedded_object_becomes_instance() {
        let task = session().get_instance(&DocRef::from("t1")).unwrap();
        let location = task.get("location").unwrap().into_instance().unwrap();
        assert_eq!(location.class(), "class:crm.Address");
        assert!(location.id().is_none());
        assert_eq!(location.get("street").unwrap().as_str(), Some("Main"));
        assert_eq!(location.get("city").unwrap().as_str(), Some("Nowhere"));
    }

    #[test]
    fn array_of_embedded_objects() {
        let task = session().get_instance(&DocRef::from("t1")).unwrap();
        let stops = task.get("stops").unwrap();
        let streets: Vec<_> = stops
            .as_array()
            .unwrap()
            .iter()
            .map(|s| {
                s.as_instance()
                    .unwrap()
                    .get("street")
                    .unwrap()
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(streets, vec!["A", "B"]);
    }

    #[test]
    fn reference_is_not_dereferenced() {
        let task = session().get_instance(&DocRef::from("t1")).unwrap();
        assert_eq!(task.get("owner").unwrap(), Exerted::Value(Value::from("u1")));
    }

    #[test]
    fn metadata_attribute_resolves() {
        let task = session().get_instance(&DocRef::from("t1")).unwrap();
        assert_eq!(task.get("icon").unwrap().as_str(), Some("/img/task.svg"));
    }

    #[test]
    fn native_method_sees_the_instance() {
        let task = session().get_instance(&DocRef::from("t1")).unwrap();
        assert_eq!(task.get("title").unwrap().as_str(), Some("Task: Fix bug"));
    }

    #[test]
    fn class_instance_is_the_class_document() {
        let task = session().get_instance(&DocRef::from("t1")).unwrap();
        let class = task.class_instance().unwrap();
        assert_eq!(class.id(), Some(&DocRef::from("class:task.Task")));
        assert_eq!(class.get("_extends").unwrap().as_str(), Some(builtin::DOC));
    }

    #[test]
    fn class_accessor_comes_from_the_root() {
        let task = session().get_instance(&DocRef::from("t1")).unwrap();
        let class = task.get("class").unwrap().into_instance().unwrap();
        assert_eq!(class.id(), Some(&DocRef::from("class:task.Task")));
        assert_eq!(class.class(), builtin::CLASS);

        let location = task.get("location").unwrap().into_instance().unwrap();
        let address = location.get("class").unwrap().into_instance().unwrap();
        assert_eq!(address.id(), Some(&DocRef::from("class:crm.Address")));
    }

    #[test]
    fn attributes_lists_all_declared() {
        let task = session().get_instance(&DocRef::from("t1")).unwrap();
        let attrs = task.attributes().unwrap();
        let names: Vec<_> = attrs.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["icon", "location", "name", "owner", "stops", "title"]
        );
    }

    #[test]
    fn two_views_of_one_document_are_equal() {
        let session = session();
        let a = session.get_instance(&DocRef::from("t1")).unwrap();
        let b = session.get_instance(&DocRef::from("t1")).unwrap();
        assert_eq!(a, b);
        assert!(a.is(&ClassRef::from(builtin::DOC)).unwrap());
    }
}
