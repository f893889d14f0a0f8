//! Document filters.

use serde_json::Value;

use super::Document;

/// Predicate over documents.
///
/// String-array fields match when any element matches, so a filter on
/// `food_items` selects every hierarchy document listing that item.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document.
    All,
    /// Field equals `value` exactly.
    Eq { field: String, value: Value },
    /// Field contains `needle`, ignoring case.
    ContainsIgnoreCase { field: String, needle: String },
    /// Field equals `value`, ignoring case.
    EqualsIgnoreCase { field: String, value: String },
    /// Every inner filter matches.
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn contains_ignore_case(field: &str, needle: &str) -> Self {
        Self::ContainsIgnoreCase {
            field: field.to_string(),
            needle: needle.to_lowercase(),
        }
    }

    pub fn equals_ignore_case(field: &str, value: &str) -> Self {
        Self::EqualsIgnoreCase {
            field: field.to_string(),
            value: value.to_lowercase(),
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Eq { field, value } => match document.get(field) {
                Some(Value::Array(items)) if !value.is_array() => items.contains(value),
                Some(found) => found == value,
                None => false,
            },
            Self::ContainsIgnoreCase { field, needle } => {
                any_string(document.get(field), |s| s.to_lowercase().contains(needle.as_str()))
            }
            Self::EqualsIgnoreCase { field, value } => {
                any_string(document.get(field), |s| s.to_lowercase() == *value)
            }
            Self::And(filters) => filters.iter().all(|f| f.matches(document)),
        }
    }
}

fn any_string(value: Option<&Value>, predicate: impl Fn(&str) -> bool) -> bool {
    match value {
        Some(Value::String(s)) => predicate(s),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).any(predicate),
        _ => false,
    }
}
