use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};

/// A stored cell value: the raw representation, the human-readable one,
/// and optionally a link marking the cell as a foreign key.
///
/// Every cell in the dataset has this shape; a cell without `link` is a
/// plain scalar and carries `value == display_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: String,

    pub display_value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Cell {
    /// Convert a raw dataset value into a cell, rejecting anything that
    /// is not an object with string `value` and `display_value` keys.
    pub fn from_value(raw: &Value) -> ApiResult<Self> {
        let obj = raw.as_object().ok_or_else(|| {
            ApiError::InvalidDataset(format!("Cell is not an object: {raw}"))
        })?;
        let value = obj
            .get("value")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::InvalidDataset(format!("Cell missing 'value': {raw}")))?;
        let display_value = obj.get("display_value").and_then(Value::as_str).ok_or_else(|| {
            ApiError::InvalidDataset(format!("Cell missing 'display_value': {raw}"))
        })?;
        let link = match obj.get("link") {
            None => None,
            Some(Value::String(link)) => Some(link.clone()),
            Some(other) => {
                return Err(ApiError::InvalidDataset(format!(
                    "Cell 'link' is not a string: {other}"
                )))
            }
        };
        Ok(Self {
            value: value.to_string(),
            display_value: display_value.to_string(),
            link,
        })
    }

    pub fn is_link(&self) -> bool {
        self.link.is_some()
    }

    /// Shape this cell for a response at the given display mode.
    ///
    /// Link cells keep their link alongside the selected representation;
    /// plain cells collapse to a bare string except in `All` mode.
    pub fn render(&self, mode: DisplayMode) -> Value {
        match mode {
            DisplayMode::Value => match &self.link {
                Some(link) => json!({"value": self.value, "link": link}),
                None => Value::String(self.value.clone()),
            },
            DisplayMode::Display => match &self.link {
                Some(link) => json!({"display_value": self.display_value, "link": link}),
                None => Value::String(self.display_value.clone()),
            },
            DisplayMode::All => serde_json::to_value(self).unwrap_or(Value::Null),
        }
    }
}

/// How resolved cells are rendered, from `sysparm_display_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// `false`: raw values (the default, and what matchers compare on)
    #[default]
    Value,
    /// `true`: human-readable display values
    Display,
    /// `all`: the full value/display_value/link structure
    All,
}

impl FromStr for DisplayMode {
    type Err = ApiError;

    fn from_str(token: &str) -> ApiResult<Self> {
        match token {
            "false" => Ok(DisplayMode::Value),
            "true" => Ok(DisplayMode::Display),
            "all" => Ok(DisplayMode::All),
            other => Err(ApiError::Validation(format!(
                "Invalid sysparm_display_value: '{other}'"
            ))),
        }
    }
}
