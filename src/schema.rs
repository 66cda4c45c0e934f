use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Text,
    Tag,
    Numeric,
    Geo,
}

fn default_weight() -> f64 {
    1.0
}

/// One declared index field. `weight` and `noStem` only apply to TEXT fields,
/// `separator` only to TAG fields; the engine ignores them elsewhere and so do
/// we.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecl {
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub name: String,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub no_index: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub no_stem: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<char>,
}

impl FieldDecl {
    /// Renders the declaration as FT.CREATE/FT.ALTER schema arguments.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.name.clone()];
        match self.kind {
            FieldType::Text => {
                args.push("TEXT".to_string());
                args.push("WEIGHT".to_string());
                args.push(self.weight.to_string());
                if self.no_stem {
                    args.push("NOSTEM".to_string());
                }
            }
            FieldType::Tag => {
                args.push("TAG".to_string());
                if let Some(separator) = self.separator {
                    args.push("SEPARATOR".to_string());
                    args.push(separator.to_string());
                }
            }
            FieldType::Numeric => args.push("NUMERIC".to_string()),
            FieldType::Geo => args.push("GEO".to_string()),
        }
        if self.sortable {
            args.push("SORTABLE".to_string());
        }
        if self.no_index {
            args.push("NOINDEX".to_string());
        }
        args
    }
}

/// The declared schema. Field order is preserved so additive schema changes
/// are issued in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub fields: Vec<FieldDecl>,
}

impl IndexSchema {
    pub fn validate(&self) -> crate::Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(crate::error::duplicate_field(field.name.clone()));
            }
        }
        Ok(())
    }
}
