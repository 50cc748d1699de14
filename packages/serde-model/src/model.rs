//! Documents as JSON, and model files.
//!
//! A model file is either a flat array of documents or an object mapping a
//! domain name to an array of documents. Domains are concatenated in key
//! order; the domain names themselves carry no meaning at load time, since
//! each class declares its own domain.

use std::io::Read;

use docmodel_core::Document;

use crate::convert::{json_to_value, value_to_json};
use crate::Error;

/// A document in its flat JSON form (`_class`, `_id`, `_mixins` plus
/// attributes).
pub fn document_to_json(doc: &Document) -> serde_json::Value {
    value_to_json(doc.to_value())
}

pub fn document_from_json(json: serde_json::Value) -> Result<Document, Error> {
    Ok(Document::from_value(&json_to_value(json))?)
}

/// Documents from a parsed model file.
pub fn documents_from_json(json: serde_json::Value) -> Result<Vec<Document>, Error> {
    match json {
        serde_json::Value::Array(docs) => docs.into_iter().map(document_from_json).collect(),
        serde_json::Value::Object(domains) => {
            // serde_json's map iterates in key order without `preserve_order`
            let mut all = Vec::new();
            for (domain, docs) in domains {
                let serde_json::Value::Array(docs) = docs else {
                    return Err(Error::malformed(format!(
                        "domain '{}' must hold an array of documents",
                        domain
                    )));
                };
                log::debug!("Reading {} documents for domain {}", docs.len(), domain);
                for doc in docs {
                    all.push(document_from_json(doc)?);
                }
            }
            Ok(all)
        }
        _ => Err(Error::malformed(
            "expected an array of documents or an object of domains",
        )),
    }
}

/// Parse a model file's text into documents ready for `load_model`.
pub fn load_model_json(text: &str) -> Result<Vec<Document>, Error> {
    documents_from_json(serde_json::from_str(text)?)
}

pub fn read_model<R: Read>(reader: R) -> Result<Vec<Document>, Error> {
    documents_from_json(serde_json::from_reader(reader)?)
}

/// Render documents as a flat model file.
pub fn model_to_json(docs: &[Document]) -> serde_json::Value {
    serde_json::Value::Array(docs.iter().map(document_to_json).collect())
}
