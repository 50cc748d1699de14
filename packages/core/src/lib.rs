//! docmodel core: the data layer of the model runtime
//!
//! Everything here is plain data with no behavior attached:
//! - `Value`: raw attribute data as stored
//! - `ClassRef` / `DocRef`: typed string references
//! - `Document` / `Obj`: stored records and embedded objects
//! - `Class` / `Type`: the schema, which is itself loaded as documents
//! - `Error`: model-integrity faults shared by all layers
//!
//! # Example
//!
//! ```rust
//! use docmodel_core::{builtin, Class, Document, Type};
//!
//! let task = Class::new("class:task.Task")
//!     .extends(builtin::DOC)
//!     .attribute("name", Type::primitive());
//!
//! let class_doc: Document = task.to_document();
//! assert_eq!(class_doc.class, builtin::CLASS);
//! ```

pub mod builtin;
mod class;
mod document;
mod error;
mod refs;
mod value;

pub use builtin::BuiltinType;
pub use class::{BuiltinOnly, Class, Type, TypeKind, TypeResolver};
pub use document::{Document, Obj};
pub use error::Error;
pub use refs::{ClassRef, DocRef};
pub use value::Value;
