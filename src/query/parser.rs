//! Parsers for the sysparm query-string components.
//!
//! Five small grammars: the filter expression (`sysparm_query`), field
//! and group-by lists, and the offset/limit integers. Each returns a
//! typed AST or a Syntax error naming the offending fragment; semantic
//! checks (field existence, value types) happen at evaluation time.

use super::ast::{FieldPath, Matcher, OrGroup, QueryExpr};
use crate::error::{ApiError, ApiResult};

/// Parse a `sysparm_query` filter expression.
///
/// The string splits on bare `^` into AND segments; each segment splits
/// on `^OR` into matchers. A `^` immediately followed by `OR` belongs to
/// the OR split, so OR binds tighter than AND.
pub fn parse_query(input: &str) -> ApiResult<QueryExpr> {
    if input.is_empty() {
        return Err(ApiError::Syntax("Empty query expression".to_string()));
    }
    let mut terms: Vec<Vec<&str>> = Vec::new();
    for part in input.split('^') {
        if let Some(rest) = part.strip_prefix("OR") {
            let Some(group) = terms.last_mut() else {
                return Err(ApiError::Syntax(format!(
                    "Query cannot start with an OR term: '{input}'"
                )));
            };
            group.push(rest);
        } else {
            terms.push(vec![part]);
        }
    }
    let terms = terms
        .into_iter()
        .map(|group| {
            let matchers = group
                .into_iter()
                .map(parse_matcher)
                .collect::<ApiResult<Vec<_>>>()?;
            Ok(OrGroup { matchers })
        })
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(QueryExpr { terms })
}

/// Parse a comma-separated dotted field list (`sysparm_fields`,
/// `sysparm_group_by`).
pub fn parse_field_list(input: &str) -> ApiResult<Vec<FieldPath>> {
    input.split(',').map(parse_field_path).collect()
}

/// Parse a non-negative integer (`sysparm_offset`).
pub fn parse_offset(input: &str) -> ApiResult<usize> {
    parse_unsigned(input, "offset")
}

/// Parse a non-negative integer (`sysparm_limit`).
pub fn parse_limit(input: &str) -> ApiResult<usize> {
    parse_unsigned(input, "limit")
}

fn parse_unsigned(input: &str, what: &str) -> ApiResult<usize> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::Syntax(format!("Invalid {what}: '{input}'")));
    }
    input
        .parse::<usize>()
        .map_err(|_| ApiError::Syntax(format!("Invalid {what}: '{input}'")))
}

fn parse_field_path(input: &str) -> ApiResult<FieldPath> {
    let segments: Vec<String> = input.split('.').map(str::to_string).collect();
    let well_formed = !input.is_empty()
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b == b'_')
        });
    if !well_formed {
        return Err(ApiError::Syntax(format!("Invalid field name: '{input}'")));
    }
    Ok(FieldPath::new(segments))
}

fn parse_matcher(input: &str) -> ApiResult<Matcher> {
    let field_len = input
        .bytes()
        .take_while(|&b| b.is_ascii_lowercase() || b == b'_' || b == b'.')
        .count();
    if field_len == 0 {
        return Err(ApiError::Syntax(format!(
            "Expected field name in matcher: '{input}'"
        )));
    }
    let field = parse_field_path(&input[..field_len])?;
    let rest = &input[field_len..];

    // Longest operators first so ISEMPTY does not shadow ISNOTEMPTY.
    if let Some(tail) = rest.strip_prefix("ISNOTEMPTY") {
        expect_no_tail(input, tail)?;
        return Ok(Matcher::NotEmpty(field));
    }
    if let Some(tail) = rest.strip_prefix("ISEMPTY") {
        expect_no_tail(input, tail)?;
        return Ok(Matcher::Empty(field));
    }
    if let Some(tail) = rest.strip_prefix("NOTLIKE") {
        return Ok(Matcher::NotContains(field, parse_value(input, tail)?));
    }
    if let Some(tail) = rest.strip_prefix("LIKE") {
        return Ok(Matcher::Contains(field, parse_value(input, tail)?));
    }
    if let Some(tail) = rest.strip_prefix("BETWEEN") {
        let Some((from, to)) = tail.split_once('@') else {
            return Err(ApiError::Syntax(format!(
                "BETWEEN requires 'from@to' bounds: '{input}'"
            )));
        };
        if from.is_empty() || to.is_empty() || to.contains('@') {
            return Err(ApiError::Syntax(format!(
                "BETWEEN requires 'from@to' bounds: '{input}'"
            )));
        }
        return Ok(Matcher::DateBetween(field, from.to_string(), to.to_string()));
    }
    if let Some(tail) = rest.strip_prefix("IN") {
        let values = tail
            .split(',')
            .map(|value| parse_value(input, value))
            .collect::<ApiResult<Vec<_>>>()?;
        return Ok(Matcher::In(field, values));
    }
    if let Some(tail) = rest.strip_prefix("!=") {
        return Ok(Matcher::IsNot(field, parse_value(input, tail)?));
    }
    if let Some(tail) = rest.strip_prefix('=') {
        // A bare "field=" is a synonym for matching the empty string.
        if tail.is_empty() {
            return Ok(Matcher::Is(field, None));
        }
        return Ok(Matcher::Is(field, Some(parse_value(input, tail)?)));
    }

    Err(ApiError::Syntax(format!("Unrecognized matcher: '{input}'")))
}

fn expect_no_tail(matcher: &str, tail: &str) -> ApiResult<()> {
    if tail.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Syntax(format!(
            "Unexpected trailing input in matcher: '{matcher}'"
        )))
    }
}

fn parse_value(matcher: &str, value: &str) -> ApiResult<String> {
    if value.is_empty() || value.contains('@') {
        return Err(ApiError::Syntax(format!(
            "Invalid value in matcher: '{matcher}'"
        )));
    }
    Ok(value.to_string())
}
