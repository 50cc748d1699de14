//! Type exertion: turning a raw stored value into its consumable form.

use std::collections::BTreeMap;

use docmodel_core::{ClassRef, Error, Obj, Type, TypeKind, Value};

use crate::Instance;

/// The result of exerting a raw value through its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Exerted {
    /// No stored value and no declared default.
    Absent,
    /// A primitive, a reference id, or metadata.
    Value(Value),
    /// An embedded object bound to its prototype.
    Instance(Instance),
    Array(Vec<Exerted>),
    Bag(BTreeMap<String, Exerted>),
}

impl Exerted {
    pub fn is_absent(&self) -> bool {
        matches!(self, Exerted::Absent)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Exerted::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Exerted::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn into_instance(self) -> Option<Instance> {
        match self {
            Exerted::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Exerted]> {
        match self {
            Exerted::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_bag(&self) -> Option<&BTreeMap<String, Exerted>> {
        match self {
            Exerted::Bag(b) => Some(b),
            _ => None,
        }
    }

    /// Flatten back into a raw value. Instances become their layout and
    /// `Absent` becomes `Null`.
    pub fn to_value(&self) -> Value {
        match self {
            Exerted::Absent => Value::Null,
            Exerted::Value(v) => v.clone(),
            Exerted::Instance(i) => i.to_value(),
            Exerted::Array(items) => Value::Array(items.iter().map(Exerted::to_value).collect()),
            Exerted::Bag(items) => Value::Map(
                items
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Exerted {
    fn from(v: Value) -> Self {
        Exerted::Value(v)
    }
}

impl From<Instance> for Exerted {
    fn from(i: Instance) -> Self {
        Exerted::Instance(i)
    }
}

/// What exertion needs from its surroundings.
pub trait ExertContext {
    /// Bind an embedded object to its class's prototype, without a store
    /// lookup.
    fn instantiate_obj(&self, obj: Obj) -> Result<Instance, Error>;

    fn is(&self, class: &ClassRef, candidate: &ClassRef) -> Result<bool, Error>;

    /// Resolve a metadata key; a miss is `MetadataMissing`.
    fn metadata(&self, key: &str) -> Result<Value, Error>;
}

/// Exert `raw` through `ty`.
///
/// `raw` is `None` when the attribute is absent from the document; that is
/// the only case where the type's default is substituted. `attribute` names
/// the attribute for error messages.
pub fn exert(
    ty: &Type,
    raw: Option<&Value>,
    attribute: &str,
    ctx: &dyn ExertContext,
) -> Result<Exerted, Error> {
    let raw = match raw.or(ty.default.as_ref()) {
        Some(raw) => raw,
        None => return Ok(Exerted::Absent),
    };
    log::trace!("Exerting {} via {}", attribute, ty.class);

    match &ty.kind {
        TypeKind::Primitive | TypeKind::RefTo(_) => Ok(Exerted::Value(raw.clone())),
        TypeKind::InstanceOf(target) => {
            if !raw.is_map() {
                return Err(Error::mismatch(attribute, "embedded object"));
            }
            let obj = Obj::from_value(raw, Some(target))?;
            if &obj.class != target && !ctx.is(&obj.class, target)? {
                return Err(Error::mismatch(
                    format!("{} ({} is not a {})", attribute, obj.class, target),
                    "embedded object of the declared class",
                ));
            }
            ctx.instantiate_obj(obj).map(Exerted::Instance)
        }
        TypeKind::BagOf(element) => {
            let items = raw
                .as_map()
                .ok_or_else(|| Error::mismatch(attribute, "map"))?;
            items
                .iter()
                .map(|(key, item)| {
                    exert(element, Some(item), &format!("{}.{}", attribute, key), ctx)
                        .map(|e| (key.clone(), e))
                })
                .collect::<Result<_, _>>()
                .map(Exerted::Bag)
        }
        TypeKind::ArrayOf(element) => {
            let items = raw
                .as_array()
                .ok_or_else(|| Error::mismatch(attribute, "array"))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| exert(element, Some(item), &format!("{}[{}]", attribute, i), ctx))
                .collect::<Result<_, _>>()
                .map(Exerted::Array)
        }
        TypeKind::MetadataBacked(declared) => {
            let key = match (raw.as_str(), declared) {
                (Some(key), _) => key,
                (None, Some(key)) => key.as_str(),
                (None, None) => return Err(Error::mismatch(attribute, "metadata key")),
            };
            ctx.metadata(key).map(Exerted::Value)
        }
    }
}
