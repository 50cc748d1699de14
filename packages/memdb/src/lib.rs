//! docmodel memdb: raw documents and the class registry
//!
//! - `ModelDb`: keyed store with bulk load, point lookup and exact-class scans
//! - Class registry operations on `ModelDb`: hierarchy walks, `is`,
//!   `is_mixed_in`, domain lookup, attribute declaration lookup
//! - `Query`: exact-value field predicate for scans
//!
//! Nothing here attaches behavior to documents; that is the session layer's
//! job.

mod hierarchy;
mod model_db;
mod query;

pub use model_db::ModelDb;
pub use query::Query;
