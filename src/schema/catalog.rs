use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Per-field metadata from a table's fields catalog.
///
/// Catalog files carry more keys than we consume (purpose, unused, ...);
/// only `reference` matters for query evaluation, the rest is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSpec {
    /// Target table when this field is a foreign key
    #[serde(default)]
    pub reference: Option<String>,
}

/// Read-only per-table field metadata, loaded once at startup.
///
/// One `<table>.json` file per table in the schema directory, each a
/// mapping of field name to metadata. A table without a catalog file
/// simply has no reference fields.
#[derive(Debug, Clone, Default)]
pub struct FieldsCatalog {
    tables: HashMap<String, HashMap<String, FieldSpec>>,
}

impl FieldsCatalog {
    /// Load every `<table>.json` catalog file under `schema_dir`.
    pub fn load(schema_dir: &Path) -> ApiResult<Self> {
        let mut tables = HashMap::new();
        if !schema_dir.exists() {
            tracing::warn!(
                "Schema directory {} does not exist, no reference fields will resolve",
                schema_dir.display()
            );
            return Ok(Self { tables });
        }
        for entry in fs::read_dir(schema_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(table) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
            else {
                return Err(ApiError::InvalidDataset(format!(
                    "Found non json catalog file: {}",
                    path.display()
                )));
            };
            let contents = fs::read_to_string(&path)?;
            let fields: HashMap<String, FieldSpec> =
                serde_json::from_str(&contents).map_err(|e| {
                    ApiError::InvalidDataset(format!(
                        "Malformed fields catalog for table '{table}': {e}"
                    ))
                })?;
            tracing::debug!("Loaded fields catalog for '{}' ({} fields)", table, fields.len());
            tables.insert(table.to_string(), fields);
        }
        Ok(Self { tables })
    }

    /// The referenced table, if `field` is catalog-marked as a foreign key.
    pub fn reference(&self, table: &str, field: &str) -> Option<&str> {
        self.tables
            .get(table)
            .and_then(|fields| fields.get(field))
            .and_then(|spec| spec.reference.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_and_lookup() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("activity.json"),
            r#"{"assigned_to": {"reference": "person", "purpose": "owner"}, "state": {}}"#,
        )
        .unwrap();

        let catalog = FieldsCatalog::load(dir.path()).unwrap();
        assert_eq!(catalog.reference("activity", "assigned_to"), Some("person"));
        assert_eq!(catalog.reference("activity", "state"), None);
        assert_eq!(catalog.reference("person", "anything"), None);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let catalog = FieldsCatalog::load(&missing).unwrap();
        assert_eq!(catalog.reference("activity", "assigned_to"), None);
    }
}
