use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::cell::Cell;
use crate::error::{ApiError, ApiResult};

/// One row of a table: a field -> cell mapping keyed by its `sys_id`.
#[derive(Debug, Clone)]
pub struct Row {
    sys_id: String,
    cells: HashMap<String, Cell>,
}

impl Row {
    pub fn sys_id(&self) -> &str {
        &self.sys_id
    }

    pub fn cell(&self, field: &str) -> Option<&Cell> {
        self.cells.get(field)
    }
}

/// A named, ordered row collection, immutable after load.
///
/// Row order is the order of the input document and is the iteration
/// order for every query; the index maps `sys_id` to row position.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
    index: HashMap<String, usize>,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field names in first-appearance order across the loaded rows.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_by_sys_id(&self, sys_id: &str) -> Option<&Row> {
        self.index.get(sys_id).map(|&pos| &self.rows[pos])
    }
}

/// Result-document wrapper used by dataset files: `{"result": [row...]}`.
#[derive(Debug, Deserialize)]
struct TableDocument {
    result: Vec<Value>,
}

/// The full dataset: one table per JSON file, loaded once and read-only
/// for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    tables: HashMap<String, Table>,
}

impl Dataset {
    /// Load every `<table>.json` file under `data_dir`.
    pub fn load(data_dir: &Path) -> ApiResult<Self> {
        let mut tables = HashMap::new();
        for entry in fs::read_dir(data_dir)? {
            let path = entry?.path();
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
            else {
                return Err(ApiError::InvalidDataset(format!(
                    "Found non json data file: {}",
                    path.display()
                )));
            };
            let contents = fs::read_to_string(&path)?;
            let document: TableDocument = serde_json::from_str(&contents).map_err(|e| {
                ApiError::InvalidDataset(format!("Malformed table document '{name}': {e}"))
            })?;
            let table = load_table(name, document)?;
            tracing::info!("Loaded table '{}' ({} rows)", name, table.len());
            tables.insert(name.to_string(), table);
        }
        Ok(Self { tables })
    }

    pub fn table(&self, name: &str) -> ApiResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| ApiError::TableNotFound(name.to_string()))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

fn load_table(name: &str, document: TableDocument) -> ApiResult<Table> {
    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    let mut index = HashMap::new();

    for raw_row in &document.result {
        let obj = raw_row.as_object().ok_or_else(|| {
            ApiError::InvalidDataset(format!("Row in table '{name}' is not an object: {raw_row}"))
        })?;
        let mut cells = HashMap::new();
        for (field, raw_cell) in obj {
            let cell = Cell::from_value(raw_cell).map_err(|e| {
                ApiError::InvalidDataset(format!("Table '{name}', field '{field}': {e}"))
            })?;
            if !columns.iter().any(|c| c == field) {
                columns.push(field.clone());
            }
            cells.insert(field.clone(), cell);
        }
        let sys_id = cells
            .get("sys_id")
            .map(|cell| cell.value.clone())
            .ok_or_else(|| {
                ApiError::InvalidDataset(format!("Row in table '{name}' has no sys_id: {raw_row}"))
            })?;
        if index.insert(sys_id.clone(), rows.len()).is_some() {
            return Err(ApiError::InvalidDataset(format!(
                "Duplicate sys_id '{sys_id}' in table '{name}'"
            )));
        }
        rows.push(Row { sys_id, cells });
    }

    Ok(Table {
        name: name.to_string(),
        columns,
        rows,
        index,
    })
}
