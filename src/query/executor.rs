use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use super::ast::{FieldPath, Matcher, OrGroup, QueryExpr};
use super::request::{parse_url, Endpoint, ParsedRequest};
use crate::dataset::{Dataset, DisplayMode, Resolver, Table};
use crate::error::{ApiError, ApiResult};
use crate::schema::FieldsCatalog;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Answers parsed requests against the loaded dataset, producing the
/// same response documents the remote service would.
///
/// The dataset and catalog are read-only after construction, so one
/// runner serves any number of concurrent requests without locking.
pub struct QueryRunner {
    dataset: Dataset,
    catalog: FieldsCatalog,
}

impl QueryRunner {
    pub fn new(dataset: Dataset, catalog: FieldsCatalog) -> Self {
        Self { dataset, catalog }
    }

    /// Load the dataset and fields catalog from their directories.
    pub fn load(data_dir: &Path, schema_dir: &Path) -> ApiResult<Self> {
        let dataset = Dataset::load(data_dir)?;
        let catalog = FieldsCatalog::load(schema_dir)?;
        Ok(Self::new(dataset, catalog))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Decompose and answer a full request URL in one step.
    pub fn query_url(&self, url: &str) -> ApiResult<Value> {
        let request = parse_url(url)?;
        self.run(&request)
    }

    /// Answer a decomposed request.
    pub fn run(&self, request: &ParsedRequest) -> ApiResult<Value> {
        match request.endpoint {
            Endpoint::Table => self.run_table(request),
            Endpoint::Stats => self.run_stats(request),
        }
    }

    /// Table endpoint: filter -> offset -> limit -> project.
    fn run_table(&self, request: &ParsedRequest) -> ApiResult<Value> {
        let table = self.dataset.table(&request.table)?;
        let mut rows = self.eval_filter(table, request.query.as_ref())?;
        tracing::debug!("table query on '{}': {} rows survive filter", table.name(), rows.len());

        if let Some(offset) = request.offset {
            rows = if offset < rows.len() {
                rows.split_off(offset)
            } else {
                Vec::new()
            };
        }
        if let Some(limit) = request.limit {
            rows.truncate(limit);
        }

        let projected = self.project(table, &rows, request.fields.as_deref(), request.display)?;
        Ok(json!({ "result": projected }))
    }

    /// Stats endpoint: filter, then a bare count or per-group counts.
    fn run_stats(&self, request: &ParsedRequest) -> ApiResult<Value> {
        if request.having.is_some() {
            return Err(ApiError::Unsupported(
                "sysparm_having evaluation".to_string(),
            ));
        }
        let table = self.dataset.table(&request.table)?;
        let rows = self.eval_filter(table, request.query.as_ref())?;
        tracing::debug!("stats query on '{}': {} rows survive filter", table.name(), rows.len());

        match &request.group_by {
            None => Ok(json!({"result": {"stats": {"count": rows.len()}}})),
            Some(fields) => self.group_by(table, fields, &rows, request.display),
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.dataset, &self.catalog)
    }

    /// Row positions surviving the filter, in table order. An absent
    /// filter keeps the whole universe.
    fn eval_filter(&self, table: &Table, query: Option<&QueryExpr>) -> ApiResult<Vec<usize>> {
        match query {
            None => Ok((0..table.len()).collect()),
            Some(expr) => self.eval_and(table, expr),
        }
    }

    /// Intersection across AND terms, applied left to right.
    fn eval_and(&self, table: &Table, expr: &QueryExpr) -> ApiResult<Vec<usize>> {
        let mut result: Option<Vec<usize>> = None;
        for group in &expr.terms {
            let rows = self.eval_or(table, group)?;
            result = Some(match result {
                None => rows,
                Some(current) => {
                    let keep: HashSet<usize> = rows.into_iter().collect();
                    current.into_iter().filter(|pos| keep.contains(pos)).collect()
                }
            });
        }
        Ok(result.unwrap_or_else(|| (0..table.len()).collect()))
    }

    /// Union across OR matchers, deduplicated by row.
    fn eval_or(&self, table: &Table, group: &OrGroup) -> ApiResult<Vec<usize>> {
        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        for matcher in &group.matchers {
            for pos in self.eval_matcher(table, matcher)? {
                if seen.insert(pos) {
                    rows.push(pos);
                }
            }
        }
        rows.sort_unstable();
        Ok(rows)
    }

    fn eval_matcher(&self, table: &Table, matcher: &Matcher) -> ApiResult<Vec<usize>> {
        tracing::debug!("matcher {:?} on '{}'", matcher, table.name());
        match matcher {
            Matcher::Empty(field) => self.select(table, field, |raw| raw.is_empty()),
            Matcher::NotEmpty(field) => self.select(table, field, |raw| !raw.is_empty()),
            Matcher::Is(field, value) => {
                let value = value.clone().unwrap_or_default();
                self.select(table, field, |raw| raw.eq_ignore_ascii_case(&value))
            }
            Matcher::IsNot(field, value) => {
                self.select(table, field, |raw| !raw.eq_ignore_ascii_case(value))
            }
            Matcher::In(field, values) => self.select(table, field, |raw| {
                values.iter().any(|value| raw.eq_ignore_ascii_case(value))
            }),
            Matcher::DateBetween(field, from, to) => self.date_between(table, field, from, to),
            Matcher::Contains(field, _) | Matcher::NotContains(field, _) => {
                Err(ApiError::Unsupported(format!(
                    "LIKE matchers (field '{field}') have no defined semantics"
                )))
            }
        }
    }

    /// Rows whose resolved raw value satisfies the predicate.
    fn select<F>(&self, table: &Table, field: &FieldPath, pred: F) -> ApiResult<Vec<usize>>
    where
        F: Fn(&str) -> bool,
    {
        let resolver = self.resolver();
        let mut rows = Vec::new();
        for (pos, row) in table.rows().iter().enumerate() {
            let raw = resolver.raw_value(table.name(), field, row.sys_id())?;
            if pred(raw) {
                rows.push(pos);
            }
        }
        Ok(rows)
    }

    /// Strictly exclusive date-range matcher.
    fn date_between(
        &self,
        table: &Table,
        field: &FieldPath,
        from: &str,
        to: &str,
    ) -> ApiResult<Vec<usize>> {
        let from = parse_date(from)?;
        let to = parse_date(to)?;
        let resolver = self.resolver();
        let mut rows = Vec::new();
        for (pos, row) in table.rows().iter().enumerate() {
            let raw = resolver.raw_value(table.name(), field, row.sys_id())?;
            let date = parse_date(raw)?;
            if from < date && date < to {
                rows.push(pos);
            }
        }
        Ok(rows)
    }

    /// Shape surviving rows into ordered field -> rendered-value objects.
    /// Without an explicit field list, every table column is projected.
    fn project(
        &self,
        table: &Table,
        rows: &[usize],
        fields: Option<&[FieldPath]>,
        mode: DisplayMode,
    ) -> ApiResult<Vec<Value>> {
        let all_columns: Vec<FieldPath>;
        let fields = match fields {
            Some(fields) => fields,
            None => {
                all_columns = table
                    .columns()
                    .iter()
                    .map(|column| FieldPath::new(vec![column.clone()]))
                    .collect();
                &all_columns
            }
        };
        let resolver = self.resolver();
        let mut projected = Vec::with_capacity(rows.len());
        for &pos in rows {
            let row = &table.rows()[pos];
            let mut object = Map::new();
            for field in fields {
                let rendered = resolver.render(table.name(), field, row.sys_id(), mode)?;
                object.insert(field.to_string(), rendered);
            }
            projected.push(Value::Object(object));
        }
        Ok(projected)
    }

    /// Group surviving rows by the rendered group-by tuple.
    ///
    /// Grouping equality is structural: the rendered values are
    /// canonically serialized and identical serializations land in the
    /// same group. Groups are emitted in first-occurrence order.
    fn group_by(
        &self,
        table: &Table,
        fields: &[FieldPath],
        rows: &[usize],
        mode: DisplayMode,
    ) -> ApiResult<Value> {
        let resolver = self.resolver();
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, (Vec<Value>, usize)> = HashMap::new();

        for &pos in rows {
            let row = &table.rows()[pos];
            let rendered = fields
                .iter()
                .map(|field| resolver.render(table.name(), field, row.sys_id(), mode))
                .collect::<ApiResult<Vec<_>>>()?;
            let key = serde_json::to_string(&rendered)?;
            if let Some((_, count)) = groups.get_mut(&key) {
                *count += 1;
            } else {
                order.push(key.clone());
                groups.insert(key, (rendered, 1));
            }
        }

        let mut result = Vec::with_capacity(order.len());
        for key in order {
            let Some((rendered, count)) = groups.remove(&key) else {
                continue;
            };
            let records: Vec<Value> = fields
                .iter()
                .zip(rendered)
                .map(|(field, value)| group_record(field, value, mode))
                .collect();
            result.push(json!({
                "groupby_fields": records,
                "stats": {"count": count},
            }));
        }
        Ok(json!({ "result": result }))
    }
}

/// One `groupby_fields` record. Link structures flatten to their scalar
/// representation; only `all` mode emits a separate `display_value` key.
fn group_record(field: &FieldPath, rendered: Value, mode: DisplayMode) -> Value {
    match mode {
        DisplayMode::All => {
            let (value, display_value) = match &rendered {
                Value::Object(obj) => (
                    obj.get("value").cloned().unwrap_or(Value::Null),
                    obj.get("display_value").cloned().unwrap_or(Value::Null),
                ),
                other => (other.clone(), other.clone()),
            };
            json!({"field": field.to_string(), "value": value, "display_value": display_value})
        }
        DisplayMode::Display => {
            let value = match rendered {
                Value::Object(obj) => obj.get("display_value").cloned().unwrap_or(Value::Null),
                other => other,
            };
            json!({"field": field.to_string(), "value": value})
        }
        DisplayMode::Value => {
            let value = match rendered {
                Value::Object(obj) => obj.get("value").cloned().unwrap_or(Value::Null),
                other => other,
            };
            json!({"field": field.to_string(), "value": value})
        }
    }
}

fn parse_date(raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| ApiError::Validation(format!("Invalid date '{raw}', expected {DATE_FORMAT}")))
}
