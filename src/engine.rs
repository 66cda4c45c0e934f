use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use redis::{ErrorKind, RedisError, Value};
use thiserror::Error;

use crate::config::AppConfig;
use crate::schema::{FieldDecl, IndexSchema};

// Hash fields holding document metadata alongside the user fields; registered
// with the index at creation and filtered back out of search results.
const SCORE_FIELD: &str = "__score";
const PAYLOAD_FIELD: &str = "__payload";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine call failed: {0}")]
    Call(#[from] RedisError),
    #[error("unexpected engine reply: {0}")]
    Reply(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Engine-native document: field values already stringified, payload raw.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: BTreeMap<String, String>,
    pub score: f64,
    pub payload: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchHits {
    pub total: u64,
    pub docs: Vec<Document>,
}

/// The engine operations the gateway needs. Handlers receive this behind an
/// `Arc` so tests can substitute a scripted engine.
pub trait Engine: Send + Sync {
    fn create_index(&self, schema: &IndexSchema) -> crate::Result<CreateOutcome>;
    fn add_fields(&self, fields: &[FieldDecl]) -> crate::Result<()>;
    fn field_names(&self) -> crate::Result<HashSet<String>>;
    fn add_document(&self, doc: &Document) -> crate::Result<bool>;
    fn search(&self, query: &str, offset: usize, limit: usize) -> crate::Result<SearchHits>;

    /// Submits documents one at a time; returns how many the engine accepted.
    /// A rejected or failed document does not abort the rest of the batch.
    fn add_batch(&self, docs: &[Document]) -> usize {
        docs.iter()
            .filter(|doc| matches!(self.add_document(doc), Ok(true)))
            .count()
    }
}

pub struct RediSearchEngine {
    client: redis::Client,
    index: String,
    prefix: String,
    timeout: Duration,
}

impl RediSearchEngine {
    pub fn connect(config: &AppConfig) -> crate::Result<Self> {
        let client = redis::Client::open(format!("redis://{}/", config.redis_host))?;
        Ok(Self {
            client,
            index: config.index.clone(),
            prefix: config.prefix.clone(),
            timeout: Duration::from_millis(config.redis_timeout_millis),
        })
    }

    fn connection(&self) -> Result<redis::Connection, EngineError> {
        let conn = self.client.get_connection_with_timeout(self.timeout)?;
        conn.set_read_timeout(Some(self.timeout))?;
        conn.set_write_timeout(Some(self.timeout))?;
        Ok(conn)
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }
}

impl Engine for RediSearchEngine {
    fn create_index(&self, schema: &IndexSchema) -> crate::Result<CreateOutcome> {
        let mut conn = self.connection()?;
        let mut cmd = redis::cmd("FT.CREATE");
        cmd.arg(&self.index)
            .arg("ON")
            .arg("HASH")
            .arg("PREFIX")
            .arg(1)
            .arg(&self.prefix)
            .arg("SCORE_FIELD")
            .arg(SCORE_FIELD)
            .arg("PAYLOAD_FIELD")
            .arg(PAYLOAD_FIELD)
            .arg("SCHEMA");
        for field in &schema.fields {
            cmd.arg(field.to_args());
        }
        match cmd.query::<()>(&mut conn) {
            Ok(()) => Ok(CreateOutcome::Created),
            Err(err) if is_index_exists(&err) => Ok(CreateOutcome::AlreadyExists),
            Err(err) => Err(EngineError::from(err).into()),
        }
    }

    fn add_fields(&self, fields: &[FieldDecl]) -> crate::Result<()> {
        let mut conn = self.connection()?;
        let mut cmd = redis::cmd("FT.ALTER");
        cmd.arg(&self.index).arg("SCHEMA").arg("ADD");
        for field in fields {
            cmd.arg(field.to_args());
        }
        cmd.query::<()>(&mut conn).map_err(EngineError::from)?;
        Ok(())
    }

    fn field_names(&self) -> crate::Result<HashSet<String>> {
        let mut conn = self.connection()?;
        let reply: Value = redis::cmd("FT.INFO")
            .arg(&self.index)
            .query(&mut conn)
            .map_err(EngineError::from)?;
        parse_info_fields(&reply).map_err(From::from)
    }

    fn add_document(&self, doc: &Document) -> crate::Result<bool> {
        let mut conn = self.connection()?;
        let mut cmd = redis::cmd("HSET");
        cmd.arg(self.key(&doc.id));
        for (name, value) in &doc.fields {
            cmd.arg(name).arg(value);
        }
        cmd.arg(SCORE_FIELD).arg(doc.score);
        if let Some(payload) = &doc.payload {
            cmd.arg(PAYLOAD_FIELD).arg(payload.as_slice());
        }
        match cmd.query::<i64>(&mut conn) {
            Ok(_) => Ok(true),
            Err(err) if is_data_error(&err) => {
                log::warn!("Engine rejected document '{}': {}", doc.id, err);
                Ok(false)
            }
            Err(err) => Err(EngineError::from(err).into()),
        }
    }

    fn search(&self, query: &str, offset: usize, limit: usize) -> crate::Result<SearchHits> {
        let mut conn = self.connection()?;
        let reply: Value = redis::cmd("FT.SEARCH")
            .arg(&self.index)
            .arg(query)
            .arg("WITHSCORES")
            .arg("WITHPAYLOADS")
            .arg("LIMIT")
            .arg(offset)
            .arg(limit)
            .query(&mut conn)
            .map_err(EngineError::from)?;
        parse_search_reply(&reply, &self.prefix).map_err(From::from)
    }
}

/// The engine signals an existing index only through its error text, so the
/// fragile message match is confined to this one function.
fn is_index_exists(err: &RedisError) -> bool {
    is_data_error(err) && err.to_string().to_ascii_lowercase().contains("already exists")
}

/// An error reply from the engine itself, as opposed to a transport failure.
fn is_data_error(err: &RedisError) -> bool {
    matches!(err.kind(), ErrorKind::ResponseError | ErrorKind::ExtensionError)
}

fn parse_info_fields(reply: &Value) -> Result<HashSet<String>, EngineError> {
    let entries = pairs(reply)?;
    // RediSearch 2.x reports "attributes", 1.x reported "fields".
    let attributes = entries
        .iter()
        .find(|entry| matches!(entry.0.as_str(), "attributes" | "fields"))
        .map(|entry| entry.1)
        .ok_or_else(|| EngineError::Reply("no attribute list in FT.INFO reply".to_string()))?;
    as_array(attributes)?.iter().map(attribute_name).collect()
}

fn attribute_name(attribute: &Value) -> Result<String, EngineError> {
    let parts = as_array(attribute)?;
    let mut iter = parts.iter();
    while let Some(part) = iter.next() {
        if as_string(part).as_deref() == Some("identifier") {
            return iter
                .next()
                .and_then(as_string)
                .ok_or_else(|| EngineError::Reply("attribute without identifier value".to_string()));
        }
    }
    // Legacy shape: the attribute entry leads with the field name.
    parts
        .first()
        .and_then(as_string)
        .ok_or_else(|| EngineError::Reply("empty attribute entry".to_string()))
}

fn parse_search_reply(reply: &Value, prefix: &str) -> Result<SearchHits, EngineError> {
    let items = as_array(reply)?;
    let mut iter = items.iter();
    let total = match iter.next() {
        Some(Value::Int(total)) => *total as u64,
        other => {
            return Err(EngineError::Reply(format!(
                "expected a result count, got {:?}",
                other
            )))
        }
    };

    let mut docs = Vec::new();
    while let Some(key) = iter.next() {
        let key = as_string(key)
            .ok_or_else(|| EngineError::Reply("document key is not a string".to_string()))?;
        let score = iter
            .next()
            .and_then(as_string)
            .and_then(|raw| raw.parse::<f64>().ok())
            .ok_or_else(|| EngineError::Reply("document score is not a number".to_string()))?;
        let payload = match iter.next() {
            Some(Value::Nil) => None,
            Some(Value::BulkString(data)) => Some(data.clone()),
            other => {
                return Err(EngineError::Reply(format!(
                    "unexpected payload entry: {:?}",
                    other
                )))
            }
        };
        let field_items = match iter.next() {
            Some(value) => as_array(value)?,
            None => {
                return Err(EngineError::Reply(
                    "document entry without a field list".to_string(),
                ))
            }
        };

        let mut fields = BTreeMap::new();
        for pair in field_items.chunks(2) {
            if let [name, value] = pair {
                if let (Some(name), Some(value)) = (as_string(name), as_string(value)) {
                    if name != SCORE_FIELD && name != PAYLOAD_FIELD {
                        fields.insert(name, value);
                    }
                }
            }
        }

        let id = key.strip_prefix(prefix).unwrap_or(&key).to_string();
        docs.push(Document {
            id,
            fields,
            score,
            payload,
        });
    }

    Ok(SearchHits { total, docs })
}

fn pairs(reply: &Value) -> Result<Vec<(String, &Value)>, EngineError> {
    match reply {
        Value::Map(entries) => Ok(entries
            .iter()
            .filter_map(|(key, value)| as_string(key).map(|key| (key, value)))
            .collect()),
        Value::Array(items) => Ok(items
            .chunks(2)
            .filter_map(|pair| match pair {
                [key, value] => as_string(key).map(|key| (key, value)),
                _ => None,
            })
            .collect()),
        other => Err(EngineError::Reply(format!(
            "expected a key/value reply, got {:?}",
            other
        ))),
    }
}

fn as_array(value: &Value) -> Result<&Vec<Value>, EngineError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(EngineError::Reply(format!(
            "expected an array reply, got {:?}",
            other
        ))),
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(data) => Some(String::from_utf8_lossy(data).into_owned()),
        Value::SimpleString(text) => Some(text.clone()),
        Value::Int(number) => Some(number.to_string()),
        Value::Double(number) => Some(number.to_string()),
        _ => None,
    }
}
