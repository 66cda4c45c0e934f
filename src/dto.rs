use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::{Document, SearchHits};

fn default_score() -> f64 {
    1.0
}

fn default_limit() -> usize {
    10
}

/// A document field value as it appears on the wire. The engine only stores
/// strings, so every variant has a fixed textual rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Null,
}

impl FieldValue {
    pub fn into_string(self) -> String {
        match self {
            FieldValue::Bool(value) => value.to_string(),
            FieldValue::Int(value) => value.to_string(),
            FieldValue::Float(value) => value.to_string(),
            FieldValue::Str(value) => value,
            FieldValue::Null => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddDocument {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    pub id: String,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default = "default_score")]
    pub score: f64,
}

impl AddDocument {
    pub fn into_document(self) -> crate::Result<Document> {
        let payload = match self.payload {
            Some(encoded) => {
                Some(base64::decode(&encoded).map_err(crate::error::value_parsing_err)?)
            }
            None => None,
        };
        Ok(Document {
            id: self.id,
            fields: self
                .fields
                .into_iter()
                .map(|(name, value)| (name, value.into_string()))
                .collect(),
            score: self.score,
            payload,
        })
    }

    pub fn from_document(doc: Document) -> Self {
        Self {
            fields: doc
                .fields
                .into_iter()
                .map(|(name, value)| (name, FieldValue::Str(value)))
                .collect(),
            id: doc.id,
            payload: doc.payload.map(|bytes| base64::encode(&bytes)),
            score: doc.score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub docs: Vec<AddDocument>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Response envelope for a search. `offset` and `limit` echo the request so a
/// client can page without re-sending its own parameters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub docs: Vec<AddDocument>,
    pub limit: usize,
    pub offset: usize,
    pub total_results: u64,
}

impl SearchResults {
    pub fn from_hits(hits: SearchHits, offset: usize, limit: usize) -> Self {
        Self {
            docs: hits.docs.into_iter().map(AddDocument::from_document).collect(),
            limit,
            offset,
            total_results: hits.total,
        }
    }
}
