//! Classes and attribute types.
//!
//! A class is itself a document (of class `class:core.Class`) whose reserved
//! fields describe the schema:
//!
//! ```json
//! {
//!   "_class": "class:core.Class",
//!   "_id": "class:task.Task",
//!   "_extends": "class:core.Doc",
//!   "_attributes": {
//!     "name": {"_class": "class:core.Type"},
//!     "tags": {"_class": "class:core.ArrayOf", "of": {"_class": "class:core.Type"}}
//!   }
//! }
//! ```
//!
//! Attribute types are embedded objects. Which exertion rule applies is
//! decided by the type object's `_class`, resolved to one of the
//! [`BuiltinType`]s through the class hierarchy.

use std::collections::BTreeMap;

use crate::builtin::{self, field, BuiltinType};
use crate::{ClassRef, Document, Error, Obj, Value};

/// Resolves a type class to the builtin behavior it inherits.
///
/// Implemented by the class registry, which can walk `extends` chains of
/// user-defined type classes.
pub trait TypeResolver {
    fn builtin_type(&self, type_class: &ClassRef) -> Result<BuiltinType, Error>;
}

/// Resolver that only knows the builtin type classes themselves.
pub struct BuiltinOnly;

impl TypeResolver for BuiltinOnly {
    fn builtin_type(&self, type_class: &ClassRef) -> Result<BuiltinType, Error> {
        BuiltinType::from_class(type_class.as_str()).ok_or_else(|| Error::UnknownClass {
            class: type_class.clone(),
        })
    }
}

/// How a raw value maps to its exerted value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Raw value returned unchanged.
    Primitive,
    /// Value is a document id; never dereferenced implicitly.
    RefTo(ClassRef),
    /// Value is an embedded object wrapped into an instance.
    InstanceOf(ClassRef),
    /// Keyed collection of elements.
    BagOf(Box<Type>),
    /// Ordered sequence of elements.
    ArrayOf(Box<Type>),
    /// Value indirects through the metadata registry.
    MetadataBacked(Option<String>),
}

/// A declared attribute type.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    /// The type object's own class (a builtin or a subclass of one).
    pub class: ClassRef,
    pub kind: TypeKind,
    /// Substituted when the stored value is absent.
    pub default: Option<Value>,
}

impl Type {
    fn builtin(builtin: BuiltinType, kind: TypeKind) -> Self {
        Self {
            class: ClassRef::from(builtin.class_id()),
            kind,
            default: None,
        }
    }

    pub fn primitive() -> Self {
        Self::builtin(BuiltinType::Primitive, TypeKind::Primitive)
    }

    pub fn ref_to(to: impl Into<ClassRef>) -> Self {
        Self::builtin(BuiltinType::RefTo, TypeKind::RefTo(to.into()))
    }

    pub fn instance_of(of: impl Into<ClassRef>) -> Self {
        Self::builtin(BuiltinType::InstanceOf, TypeKind::InstanceOf(of.into()))
    }

    pub fn bag_of(of: Type) -> Self {
        Self::builtin(BuiltinType::BagOf, TypeKind::BagOf(Box::new(of)))
    }

    pub fn array_of(of: Type) -> Self {
        Self::builtin(BuiltinType::ArrayOf, TypeKind::ArrayOf(Box::new(of)))
    }

    pub fn metadata(key: Option<&str>) -> Self {
        Self::builtin(
            BuiltinType::Metadata,
            TypeKind::MetadataBacked(key.map(str::to_string)),
        )
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Override the type object's class, e.g. for a decorated subclass.
    pub fn with_class(mut self, class: impl Into<ClassRef>) -> Self {
        self.class = class.into();
        self
    }

    /// Parse a type object.
    pub fn from_value(value: &Value, resolver: &dyn TypeResolver) -> Result<Self, Error> {
        let obj = Obj::from_value(value, None)?;
        let builtin = resolver.builtin_type(&obj.class)?;
        let kind = match builtin {
            BuiltinType::Primitive => TypeKind::Primitive,
            BuiltinType::RefTo => TypeKind::RefTo(class_field(&obj, "to")?),
            BuiltinType::InstanceOf => TypeKind::InstanceOf(class_field(&obj, "of")?),
            BuiltinType::BagOf => TypeKind::BagOf(Box::new(element_field(&obj, resolver)?)),
            BuiltinType::ArrayOf => TypeKind::ArrayOf(Box::new(element_field(&obj, resolver)?)),
            BuiltinType::Metadata => match obj.attribute("key") {
                None | Some(Value::Null) => TypeKind::MetadataBacked(None),
                Some(Value::String(key)) => TypeKind::MetadataBacked(Some(key.clone())),
                Some(other) => {
                    return Err(Error::invalid(format!(
                        "{}: metadata key must be a string, got {}",
                        obj.class,
                        other.kind()
                    )))
                }
            },
        };
        Ok(Self {
            default: obj.attribute(field::DEFAULT).cloned(),
            class: obj.class,
            kind,
        })
    }

    /// Render the type as an embedded type object.
    pub fn to_value(&self) -> Value {
        let mut obj = Obj::new(self.class.clone());
        match &self.kind {
            TypeKind::Primitive => {}
            TypeKind::RefTo(to) => obj = obj.with("to", to.as_str()),
            TypeKind::InstanceOf(of) => obj = obj.with("of", of.as_str()),
            TypeKind::BagOf(of) | TypeKind::ArrayOf(of) => obj = obj.with("of", of.to_value()),
            TypeKind::MetadataBacked(Some(key)) => obj = obj.with("key", key.as_str()),
            TypeKind::MetadataBacked(None) => {}
        }
        if let Some(default) = &self.default {
            obj = obj.with(field::DEFAULT, default.clone());
        }
        obj.to_value()
    }
}

fn class_field(obj: &Obj, name: &str) -> Result<ClassRef, Error> {
    match obj.attribute(name) {
        Some(Value::String(s)) => Ok(ClassRef::from(s.as_str())),
        _ => Err(Error::invalid(format!(
            "{} requires a class reference in '{}'",
            obj.class, name
        ))),
    }
}

fn element_field(obj: &Obj, resolver: &dyn TypeResolver) -> Result<Type, Error> {
    match obj.attribute("of") {
        Some(value) => Type::from_value(value, resolver),
        None => Err(Error::invalid(format!(
            "{} requires an element type in 'of'",
            obj.class
        ))),
    }
}

/// Parsed view of a class document.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub id: ClassRef,
    pub extends: Option<ClassRef>,
    /// Attributes declared on this class only; inherited ones live on ancestors.
    pub attributes: BTreeMap<String, Type>,
    /// Storage partition label.
    pub domain: Option<String>,
    /// Metadata key of a native implementation overlay.
    pub native: Option<String>,
}

impl Class {
    pub fn new(id: impl Into<ClassRef>) -> Self {
        Self {
            id: id.into(),
            extends: None,
            attributes: BTreeMap::new(),
            domain: None,
            native: None,
        }
    }

    pub fn extends(mut self, parent: impl Into<ClassRef>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.attributes.insert(name.into(), ty);
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn native(mut self, key: impl Into<String>) -> Self {
        self.native = Some(key.into());
        self
    }

    /// The parent class declared by a class document, without parsing its
    /// attribute types.
    pub fn extends_of(doc: &Document) -> Result<Option<ClassRef>, Error> {
        optional_str(doc, field::EXTENDS).map(|s| s.map(ClassRef::from))
    }

    /// The storage domain declared by a class document, if any.
    pub fn domain_of(doc: &Document) -> Result<Option<String>, Error> {
        optional_str(doc, field::DOMAIN).map(|s| s.map(str::to_string))
    }

    /// Parse a class document, resolving each attribute's type.
    pub fn from_document(doc: &Document, resolver: &dyn TypeResolver) -> Result<Self, Error> {
        let attributes = match doc.attribute(field::ATTRIBUTES) {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Map(attrs)) => attrs
                .iter()
                .map(|(name, ty)| {
                    Type::from_value(ty, resolver)
                        .map(|ty| (name.clone(), ty))
                        .map_err(|e| match e {
                            Error::InvalidDocument { message } => Error::invalid(format!(
                                "{}.{}: {}",
                                doc.id, name, message
                            )),
                            other => other,
                        })
                })
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(Error::invalid(format!(
                    "{}: _attributes must be a map, got {}",
                    doc.id,
                    other.kind()
                )))
            }
        };

        Ok(Self {
            id: doc.id.as_class_ref(),
            extends: Self::extends_of(doc)?,
            attributes,
            domain: Self::domain_of(doc)?,
            native: optional_str(doc, field::NATIVE)?.map(str::to_string),
        })
    }

    /// Render the class as a `class:core.Class` document.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new(builtin::CLASS, self.id.as_doc_ref());
        if let Some(extends) = &self.extends {
            doc = doc.with(field::EXTENDS, extends.as_str());
        }
        let attributes: BTreeMap<String, Value> = self
            .attributes
            .iter()
            .map(|(name, ty)| (name.clone(), ty.to_value()))
            .collect();
        doc = doc.with(field::ATTRIBUTES, Value::Map(attributes));
        if let Some(domain) = &self.domain {
            doc = doc.with(field::DOMAIN, domain.as_str());
        }
        if let Some(native) = &self.native {
            doc = doc.with(field::NATIVE, native.as_str());
        }
        doc
    }
}

fn optional_str<'a>(doc: &'a Document, name: &str) -> Result<Option<&'a str>, Error> {
    match doc.attribute(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::invalid(format!(
            "{}: {} must be a string, got {}",
            doc.id,
            name,
            other.kind()
        ))),
    }
}
