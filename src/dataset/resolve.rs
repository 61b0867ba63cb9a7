use serde_json::Value;

use super::cell::{Cell, DisplayMode};
use super::store::Dataset;
use crate::error::{ApiError, ApiResult};
use crate::query::ast::FieldPath;
use crate::schema::FieldsCatalog;

/// Resolves (possibly dotted) field paths against dataset rows.
///
/// Intermediate hops always read the raw `value` of the link cell and
/// must be catalog-marked as references; only the final hop is rendered
/// at the caller's display mode.
pub struct Resolver<'a> {
    dataset: &'a Dataset,
    catalog: &'a FieldsCatalog,
}

impl<'a> Resolver<'a> {
    pub fn new(dataset: &'a Dataset, catalog: &'a FieldsCatalog) -> Self {
        Self { dataset, catalog }
    }

    /// The cell at the end of `path`, starting from `sys_id` in `table`.
    pub fn resolve_cell(
        &self,
        table: &str,
        path: &FieldPath,
        sys_id: &str,
    ) -> ApiResult<&'a Cell> {
        self.walk(table, path.segments(), sys_id)
    }

    /// The raw `value` of the resolved cell; matchers compare on this.
    pub fn raw_value(&self, table: &str, path: &FieldPath, sys_id: &str) -> ApiResult<&'a str> {
        Ok(&self.resolve_cell(table, path, sys_id)?.value)
    }

    /// The resolved cell rendered at `mode`.
    pub fn render(
        &self,
        table: &str,
        path: &FieldPath,
        sys_id: &str,
        mode: DisplayMode,
    ) -> ApiResult<Value> {
        Ok(self.resolve_cell(table, path, sys_id)?.render(mode))
    }

    fn walk(&self, table: &str, segments: &[String], sys_id: &str) -> ApiResult<&'a Cell> {
        let source = self.dataset.table(table)?;
        let row = source
            .row_by_sys_id(sys_id)
            .ok_or_else(|| ApiError::RowNotFound(sys_id.to_string(), table.to_string()))?;
        match segments {
            [] => Err(ApiError::Schema("Empty field path".to_string())),
            [field] => row
                .cell(field)
                .ok_or_else(|| ApiError::FieldNotFound(field.clone(), table.to_string())),
            [head, rest @ ..] => {
                let cell = row
                    .cell(head)
                    .ok_or_else(|| ApiError::FieldNotFound(head.clone(), table.to_string()))?;
                let target = self.catalog.reference(table, head).ok_or_else(|| {
                    ApiError::Schema(format!(
                        "Walking non-link field: '{head}' on table '{table}' is not a reference"
                    ))
                })?;
                self.walk(target, rest, &cell.value)
            }
        }
    }
}
