//! Well-known class ids and reserved field names of the core model.

use std::collections::HashMap;

use lazy_static::lazy_static;

pub const OBJ: &str = "class:core.Obj";
pub const EMB: &str = "class:core.Emb";
pub const DOC: &str = "class:core.Doc";
pub const CLASS: &str = "class:core.Class";
pub const MIXIN: &str = "class:core.Mixin";
pub const ADAPTER: &str = "class:core.Adapter";

pub const TYPE: &str = "class:core.Type";
pub const REF_TO: &str = "class:core.RefTo";
pub const INSTANCE_OF: &str = "class:core.InstanceOf";
pub const BAG_OF: &str = "class:core.BagOf";
pub const ARRAY_OF: &str = "class:core.ArrayOf";
pub const METADATA: &str = "class:core.Metadata";

/// Reserved fields carried by every serialized object.
pub mod field {
    pub const CLASS: &str = "_class";
    pub const ID: &str = "_id";
    pub const MIXINS: &str = "_mixins";

    pub const EXTENDS: &str = "_extends";
    pub const ATTRIBUTES: &str = "_attributes";
    pub const DOMAIN: &str = "_domain";
    pub const NATIVE: &str = "_native";

    pub const DEFAULT: &str = "_default";
}

/// True for the identity fields that bypass exertion.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with('_')
}

/// The closed set of type behaviors a type class can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Primitive,
    RefTo,
    InstanceOf,
    BagOf,
    ArrayOf,
    Metadata,
}

lazy_static! {
    static ref BUILTIN_TYPES: HashMap<&'static str, BuiltinType> = {
        let mut m = HashMap::new();
        m.insert(TYPE, BuiltinType::Primitive);
        m.insert(REF_TO, BuiltinType::RefTo);
        m.insert(INSTANCE_OF, BuiltinType::InstanceOf);
        m.insert(BAG_OF, BuiltinType::BagOf);
        m.insert(ARRAY_OF, BuiltinType::ArrayOf);
        m.insert(METADATA, BuiltinType::Metadata);
        m
    };
}

impl BuiltinType {
    /// The builtin behavior declared directly by a type class, if any.
    ///
    /// User type classes deriving from these are resolved by walking the
    /// class hierarchy until this returns `Some`.
    pub fn from_class(class: &str) -> Option<BuiltinType> {
        BUILTIN_TYPES.get(class).copied()
    }

    /// The class id that declares this behavior.
    pub fn class_id(self) -> &'static str {
        match self {
            BuiltinType::Primitive => TYPE,
            BuiltinType::RefTo => REF_TO,
            BuiltinType::InstanceOf => INSTANCE_OF,
            BuiltinType::BagOf => BAG_OF,
            BuiltinType::ArrayOf => ARRAY_OF,
            BuiltinType::Metadata => METADATA,
        }
    }
}
