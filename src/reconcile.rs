use crate::engine::{CreateOutcome, Engine};
use crate::schema::{FieldDecl, IndexSchema};

/// Brings the engine's live index in line with the declared schema. Changes
/// are additive only: missing fields are added in declared order, existing
/// fields are never altered or removed, and live fields absent from the
/// declaration are left alone.
pub fn reconcile(engine: &dyn Engine, schema: &IndexSchema) -> crate::Result<()> {
    match engine.create_index(schema)? {
        CreateOutcome::Created => {
            log::info!("Created index with {} fields", schema.fields.len());
        }
        CreateOutcome::AlreadyExists => {
            let live = engine.field_names()?;
            let missing: Vec<FieldDecl> = schema
                .fields
                .iter()
                .filter(|field| !live.contains(&field.name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                log::info!(
                    "Adding new fields to index: {}",
                    missing
                        .iter()
                        .map(|field| field.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                engine.add_fields(&missing)?;
            }
        }
    }
    Ok(())
}
