use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::engine::{CreateOutcome, Document, Engine, SearchHits};
use crate::schema::{FieldDecl, IndexSchema};
use crate::AppState;

/// Scripted engine stand-in. Records every call so tests can assert what
/// reached the backend, and never touches the network.
#[derive(Default)]
pub struct MockEngine {
    /// `Some` makes create_index report an existing index with these fields.
    pub live_fields: Option<HashSet<String>>,
    /// Documents with these ids are reported as rejected by the engine.
    pub reject_ids: HashSet<String>,
    pub hits: SearchHits,

    pub created: Mutex<Vec<Vec<String>>>,
    pub altered: Mutex<Vec<Vec<String>>>,
    pub added: Mutex<Vec<Document>>,
    pub searches: Mutex<Vec<(String, usize, usize)>>,
}

impl Engine for MockEngine {
    fn create_index(&self, schema: &IndexSchema) -> crate::Result<CreateOutcome> {
        self.created
            .lock()
            .unwrap()
            .push(schema.fields.iter().map(|field| field.name.clone()).collect());
        match self.live_fields {
            Some(_) => Ok(CreateOutcome::AlreadyExists),
            None => Ok(CreateOutcome::Created),
        }
    }

    fn add_fields(&self, fields: &[FieldDecl]) -> crate::Result<()> {
        self.altered
            .lock()
            .unwrap()
            .push(fields.iter().map(|field| field.name.clone()).collect());
        Ok(())
    }

    fn field_names(&self) -> crate::Result<HashSet<String>> {
        Ok(self.live_fields.clone().unwrap_or_default())
    }

    fn add_document(&self, doc: &Document) -> crate::Result<bool> {
        self.added.lock().unwrap().push(doc.clone());
        Ok(!self.reject_ids.contains(&doc.id))
    }

    fn search(&self, query: &str, offset: usize, limit: usize) -> crate::Result<SearchHits> {
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), offset, limit));
        Ok(self.hits.clone())
    }
}

pub fn live_engine(fields: Vec<&str>) -> MockEngine {
    MockEngine {
        live_fields: Some(fields.into_iter().map(String::from).collect()),
        ..MockEngine::default()
    }
}

pub fn doc(id: &str, fields: Vec<(&str, &str)>) -> Document {
    Document {
        id: id.to_string(),
        fields: fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        score: 1.0,
        payload: None,
    }
}

pub fn state(engine: Arc<MockEngine>) -> AppState {
    let mut config = AppConfig::sample();
    config.submission_token = "sekrit".to_string();
    AppState::new(config, engine).unwrap()
}
