use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{FieldDecl, FieldType, IndexSchema};

fn default_timeout_millis() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub index: String,
    /// Key namespace for stored documents; document ids are appended to it.
    pub prefix: String,
    pub redis_host: String,
    #[serde(default = "default_timeout_millis")]
    pub redis_timeout_millis: u64,
    pub bind_address: SocketAddr,
    #[serde(default)]
    pub root_path: String,
    pub cors_allow_origins: String,
    pub submission_token: String,
    pub schema: IndexSchema,
}

impl AppConfig {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_str(&raw)
    }

    fn from_str(raw: &str) -> crate::Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(raw).map_err(crate::error::value_parsing_err)?;
        config.schema.validate()?;
        Ok(config)
    }

    pub fn sample() -> Self {
        Self {
            index: "example".to_string(),
            prefix: "doc:".to_string(),
            redis_host: "localhost:6379".to_string(),
            redis_timeout_millis: default_timeout_millis(),
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            root_path: String::new(),
            cors_allow_origins: "*".to_string(),
            submission_token: Uuid::new_v4().to_string(),
            schema: IndexSchema {
                fields: vec![
                    field(FieldType::Text, "title", true, false, 5.0, false, None),
                    field(FieldType::Text, "body", false, false, 1.0, false, None),
                    field(FieldType::Numeric, "price", true, true, 1.0, false, None),
                    field(FieldType::Tag, "tags", false, false, 1.0, false, Some(',')),
                ],
            },
        }
    }
}

pub fn sample_yaml() -> crate::Result<String> {
    serde_yaml::to_string(&AppConfig::sample()).map_err(From::from)
}

fn field(
    kind: FieldType,
    name: &str,
    sortable: bool,
    no_index: bool,
    weight: f64,
    no_stem: bool,
    separator: Option<char>,
) -> FieldDecl {
    FieldDecl {
        kind,
        name: name.to_string(),
        sortable,
        no_index,
        weight,
        no_stem,
        separator,
    }
}
