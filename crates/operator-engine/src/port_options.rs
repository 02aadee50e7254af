//! Dropdown options for operator inputs
//!
//! Some inputs take one value out of a set only known at edit time: the
//! named variables currently in scope, the devices a host registered, and
//! so on. Operators expose these through the
//! [`DropdownProvider`](crate::operator::DropdownProvider) capability and
//! hosts query them with
//! [`Engine::dropdown_options`](crate::engine::Engine::dropdown_options).

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One choice for an input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortOption {
    /// Written into the input when chosen
    pub value: Value,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PortOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description: None,
        }
    }

    /// Text option labelled with its own value
    pub fn text(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::new(Value::Text(label.clone()), label)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Label filter plus paging window
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortOptionsQuery {
    /// Case-insensitive substring of the label
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PortOptionsQuery {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    fn matches(&self, option: &PortOption) -> bool {
        match &self.search {
            Some(needle) => option.label.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortOptionsResult {
    pub options: Vec<PortOption>,
    /// Matches before paging
    pub total_count: usize,
}

impl PortOptionsResult {
    pub fn from_options(options: Vec<PortOption>, query: &PortOptionsQuery) -> Self {
        let mut matching: Vec<PortOption> =
            options.into_iter().filter(|o| query.matches(o)).collect();
        let total_count = matching.len();

        let start = query.offset.unwrap_or(0).min(total_count);
        let end = query
            .limit
            .map_or(total_count, |limit| start.saturating_add(limit).min(total_count));
        matching.truncate(end);
        matching.drain(..start);

        Self {
            options: matching,
            total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variables() -> Vec<PortOption> {
        vec![
            PortOption::text("Speed"),
            PortOption::text("scale"),
            PortOption::text("offset"),
        ]
    }

    #[test]
    fn test_text_option_json() {
        let option = PortOption::text("speed").with_description("float variable");

        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["label"], "speed");
        assert_eq!(json["value"]["value"], "speed");
        assert_eq!(json["description"], "float variable");

        let bare = serde_json::to_value(PortOption::new(2i64, "two")).unwrap();
        assert!(bare.get("description").is_none());
    }

    #[test]
    fn test_search_ignores_case() {
        let result = PortOptionsResult::from_options(variables(), &PortOptionsQuery::search("SPE"));
        assert_eq!(result.total_count, 1);
        assert_eq!(result.options[0].label, "Speed");
    }

    #[test]
    fn test_paging_window() {
        let query = PortOptionsQuery {
            search: Some("s".into()),
            limit: Some(1),
            offset: Some(1),
        };
        let result = PortOptionsResult::from_options(variables(), &query);
        assert_eq!(result.total_count, 3);
        assert_eq!(result.options.len(), 1);
        assert_eq!(result.options[0].label, "scale");

        let past_end = PortOptionsQuery {
            offset: Some(10),
            ..PortOptionsQuery::default()
        };
        let result = PortOptionsResult::from_options(variables(), &past_end);
        assert!(result.options.is_empty());
        assert_eq!(result.total_count, 3);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalCount"], 3);
    }
}
