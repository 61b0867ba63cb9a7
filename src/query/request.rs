use std::collections::HashMap;

use url::Url;

use super::ast::{FieldPath, QueryExpr};
use super::parser::{parse_field_list, parse_limit, parse_offset, parse_query};
use crate::dataset::DisplayMode;
use crate::error::{ApiError, ApiResult};

const TABLE_PREFIX: &str = "/api/now/table/";
const STATS_PREFIX: &str = "/api/now/stats/";

/// Which query surface a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Row listing (`/api/now/table/<table>`)
    Table,
    /// Aggregate counts (`/api/now/stats/<table>`)
    Stats,
}

/// A fully decomposed request: endpoint, table, and every recognized
/// sysparm parameter run through its grammar. Built once per request,
/// immutable, discarded after evaluation.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub endpoint: Endpoint,
    pub table: String,
    pub query: Option<QueryExpr>,
    pub fields: Option<Vec<FieldPath>>,
    pub group_by: Option<Vec<FieldPath>>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub display: DisplayMode,
    /// Recorded for presence only; evaluation rejects it.
    pub having: Option<String>,
}

/// Decompose a request path plus decoded query parameters.
pub fn parse_request(
    path: &str,
    params: &HashMap<String, String>,
) -> ApiResult<ParsedRequest> {
    if let Some(table) = path.strip_prefix(TABLE_PREFIX) {
        decompose(Endpoint::Table, table, params)
    } else if let Some(table) = path.strip_prefix(STATS_PREFIX) {
        decompose(Endpoint::Stats, table, params)
    } else {
        Err(ApiError::UnrecognizedPath(path.to_string()))
    }
}

/// Decompose a full URL (scheme/host optional, as clients pass bare
/// paths like `/api/now/table/person?sysparm_query=...`).
pub fn parse_url(input: &str) -> ApiResult<ParsedRequest> {
    let absolute = if input.starts_with('/') {
        format!("https://placeholder{input}")
    } else {
        input.to_string()
    };
    let url = Url::parse(&absolute)
        .map_err(|e| ApiError::Validation(format!("Invalid URL '{input}': {e}")))?;
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    parse_request(url.path(), &params)
}

/// Dispatch each known sysparm parameter through its grammar.
///
/// Unrecognized parameters (including `sysparm_exclude_reference_link`)
/// are ignored.
pub fn decompose(
    endpoint: Endpoint,
    table: &str,
    params: &HashMap<String, String>,
) -> ApiResult<ParsedRequest> {
    if table.is_empty() || table.contains('/') {
        return Err(ApiError::UnrecognizedPath(format!(
            "Missing or malformed table name: '{table}'"
        )));
    }
    if endpoint == Endpoint::Stats && params.get("sysparm_count").map(String::as_str) != Some("true")
    {
        // The aggregate endpoint is only ever used for counting; anything
        // else violates its contract.
        return Err(ApiError::Validation(
            "Stats endpoint requires sysparm_count=true".to_string(),
        ));
    }

    let query = params
        .get("sysparm_query")
        .map(|raw| parse_query(raw))
        .transpose()?;
    let fields = match endpoint {
        Endpoint::Table => params
            .get("sysparm_fields")
            .map(|raw| parse_field_list(raw))
            .transpose()?,
        Endpoint::Stats => None,
    };
    let group_by = match endpoint {
        Endpoint::Stats => params
            .get("sysparm_group_by")
            .map(|raw| parse_field_list(raw))
            .transpose()?,
        Endpoint::Table => None,
    };
    let offset = match endpoint {
        Endpoint::Table => params
            .get("sysparm_offset")
            .map(|raw| parse_offset(raw))
            .transpose()?,
        Endpoint::Stats => None,
    };
    let limit = match endpoint {
        Endpoint::Table => params
            .get("sysparm_limit")
            .map(|raw| parse_limit(raw))
            .transpose()?,
        Endpoint::Stats => None,
    };
    let display = params
        .get("sysparm_display_value")
        .map(|raw| raw.parse::<DisplayMode>())
        .transpose()?
        .unwrap_or_default();
    let having = params.get("sysparm_having").cloned();

    Ok(ParsedRequest {
        endpoint,
        table: table.to_string(),
        query,
        fields,
        group_by,
        offset,
        limit,
        display,
        having,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_url() {
        let request = parse_url(
            "/api/now/table/person?sysparm_query=name%3Dalice&sysparm_fields=sys_id,name&sysparm_offset=5&sysparm_limit=10",
        )
        .unwrap();
        assert_eq!(request.endpoint, Endpoint::Table);
        assert_eq!(request.table, "person");
        assert!(request.query.is_some());
        assert_eq!(request.fields.as_ref().unwrap().len(), 2);
        assert_eq!(request.offset, Some(5));
        assert_eq!(request.limit, Some(10));
        assert_eq!(request.display, DisplayMode::Value);
    }

    #[test]
    fn test_parse_stats_url() {
        let request = parse_url(
            "/api/now/stats/activity?sysparm_count=true&sysparm_group_by=state&sysparm_display_value=all",
        )
        .unwrap();
        assert_eq!(request.endpoint, Endpoint::Stats);
        assert_eq!(request.table, "activity");
        assert_eq!(request.group_by.as_ref().unwrap().len(), 1);
        assert_eq!(request.display, DisplayMode::All);
    }

    #[test]
    fn test_stats_requires_count() {
        assert!(parse_url("/api/now/stats/activity").is_err());
        assert!(parse_url("/api/now/stats/activity?sysparm_count=false").is_err());
        assert!(parse_url("/api/now/stats/activity?sysparm_count=true").is_ok());
    }

    #[test]
    fn test_unrecognized_path() {
        assert!(matches!(
            parse_url("/api/now/attachment/person"),
            Err(ApiError::UnrecognizedPath(_))
        ));
        assert!(parse_url("/api/now/table/").is_err());
    }

    #[test]
    fn test_invalid_display_value() {
        assert!(matches!(
            parse_url("/api/now/table/person?sysparm_display_value=maybe"),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_params_ignored() {
        let request = parse_url(
            "/api/now/table/person?sysparm_exclude_reference_link=true&sysparm_nonsense=1",
        )
        .unwrap();
        assert!(request.query.is_none());
        assert!(request.fields.is_none());
    }

    #[test]
    fn test_having_recorded_not_parsed() {
        let request =
            parse_url("/api/now/stats/activity?sysparm_count=true&sysparm_having=count%3E1")
                .unwrap();
        assert_eq!(request.having.as_deref(), Some("count>1"));
    }
}
