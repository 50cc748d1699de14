//! docmodel session: typed instances over raw documents
//!
//! This layer attaches behavior to the data in `docmodel-memdb`:
//! - `exert`: converts a raw attribute value per its declared `Type`
//! - `Prototype`: per-class accessor table, built lazily and memoized in a
//!   `PrototypeCache`
//! - `Instance`: a document (or embedded object) bound to its prototype
//! - `MixinView`: a base instance with a mixin facet layered on top
//! - `MetadataRegistry`: where metadata values and native implementations
//!   come from
//! - `Session`: owns all of the above and is the entry point
//!
//! # Example
//!
//! ```rust
//! use docmodel_core::{builtin, Class, ClassRef, Document, Type};
//! use docmodel_session::Session;
//!
//! let session = Session::default();
//! session.load_model(vec![
//!     Class::new(builtin::OBJ).to_document(),
//!     Class::new(builtin::DOC).extends(builtin::OBJ).to_document(),
//!     Class::new("class:task.Task")
//!         .extends(builtin::DOC)
//!         .attribute("tags", Type::array_of(Type::primitive()))
//!         .to_document(),
//!     Document::new("class:task.Task", "t1").with("tags", vec!["a", "b"]),
//! ]).unwrap();
//!
//! let task = session.get_instance(&"t1".into()).unwrap();
//! assert_eq!(task.get("tags").unwrap().as_array().unwrap().len(), 2);
//! assert!(task.is(&ClassRef::from(builtin::OBJ)).unwrap());
//! ```

mod exert;
mod instance;
mod metadata;
mod mixin;
mod prototype;
mod session;

pub use exert::{exert, ExertContext, Exerted};
pub use instance::{Instance, Layout};
pub use metadata::{InMemoryMetadata, MetadataRegistry, NativeFn, NativeImpl};
pub use mixin::MixinView;
pub use prototype::{Accessor, Prototype, PrototypeCache, CLASS_ACCESSOR};
pub use session::Session;

// Re-export the lower layers for convenience
pub use docmodel_core::{ClassRef, DocRef, Document, Error, Value};
pub use docmodel_memdb::{ModelDb, Query};
