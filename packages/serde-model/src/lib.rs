//! Serde integration for docmodel
//!
//! - `Value` <-> serde conversions (`to_value`, `from_value`) and their JSON
//!   counterparts
//! - Documents as JSON, and model files (`load_model_json`, `read_model`)
//! - `TypedInstance` / `TypedSession`: read instances into Rust types and
//!   create documents from them
//!
//! # Example
//!
//! ```rust
//! use docmodel_serde::load_model_json;
//! use docmodel_session::Session;
//!
//! let docs = load_model_json(r#"{
//!     "core": [
//!         {"_class": "class:core.Class", "_id": "class:core.Obj"},
//!         {"_class": "class:core.Class", "_id": "class:task.Task",
//!          "_extends": "class:core.Obj",
//!          "_attributes": {"name": {"_class": "class:core.Type"}}}
//!     ],
//!     "tasks": [{"_class": "class:task.Task", "_id": "t1", "name": "Fix bug"}]
//! }"#).unwrap();
//!
//! let session = Session::default();
//! session.load_model(docs).unwrap();
//! let task = session.get_instance(&"t1".into()).unwrap();
//! assert_eq!(task.get("name").unwrap().as_str(), Some("Fix bug"));
//! ```

mod convert;
mod error;
mod model;
mod typed;

pub use convert::{from_value, json_to_value, to_value, value_to_json};
pub use error::Error;
pub use model::{
    document_from_json, document_to_json, documents_from_json, load_model_json, model_to_json,
    read_model,
};
pub use typed::{TypedInstance, TypedSession};
