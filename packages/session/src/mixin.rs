//! Mixin views: a secondary typed facet layered over a base instance.

use docmodel_core::builtin::field;
use docmodel_core::{ClassRef, DocRef, Error};

use crate::{Exerted, Instance};

/// Composite read view of a document and one of its mixins.
///
/// Reads prefer the mixin document's own attributes. Anything the mixin
/// does not store falls through to the base instance when the base class
/// declares it, and otherwise resolves through the mixin class (so mixin
/// defaults apply). The base document is never modified by attaching a mixin.
#[derive(Debug, Clone, PartialEq)]
pub struct MixinView {
    mixin: Instance,
    base: Instance,
}

impl MixinView {
    pub(crate) fn new(mixin: Instance, base: Instance) -> Self {
        Self { mixin, base }
    }

    /// The mixin class.
    pub fn class(&self) -> &ClassRef {
        self.mixin.class()
    }

    pub fn id(&self) -> Option<&DocRef> {
        self.base.id()
    }

    /// The mixin document bound to the mixin class's prototype.
    pub fn mixin(&self) -> &Instance {
        &self.mixin
    }

    pub fn base(&self) -> &Instance {
        &self.base
    }

    /// Read an attribute, mixin first, base as fallback.
    ///
    /// `_class` reports the mixin class; `_mixins` reports the base's set.
    pub fn get(&self, name: &str) -> Result<Exerted, Error> {
        let from_mixin = match name {
            field::CLASS | field::ID => true,
            field::MIXINS => false,
            _ => {
                self.mixin.raw(name).is_some()
                    || self.base.prototype().resolve(name).is_none()
            }
        };
        if from_mixin {
            self.mixin.get(name)
        } else {
            self.base.get(name)
        }
    }
}
