//! Query record types.

use serde::{Deserialize, Serialize};

use crate::storage::Keyed;

/// One executed GraphQL operation, as stored in history or favorites.
///
/// Identity is `(query, variables, headers, extensions, operation_name)`;
/// `label` and `favorite` are annotations and never affect equality checks
/// made by the stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecord {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
}

impl QueryRecord {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_variables(mut self, variables: impl Into<String>) -> Self {
        self.variables = Some(variables.into());
        self
    }

    pub fn with_headers(mut self, headers: impl Into<String>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    pub fn with_extensions(mut self, extensions: impl Into<String>) -> Self {
        self.extensions = Some(extensions.into());
        self
    }

    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    pub fn is_favorite(&self) -> bool {
        self.favorite.unwrap_or(false)
    }

    /// Copy of the identity fields only, without label or favorite flag.
    pub fn identity(&self) -> Self {
        Self {
            query: self.query.clone(),
            variables: self.variables.clone(),
            headers: self.headers.clone(),
            extensions: self.extensions.clone(),
            operation_name: self.operation_name.clone(),
            label: None,
            favorite: None,
        }
    }

    /// Short human-readable name: label, then operation name, then the first
    /// non-blank line of the query.
    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.operation_name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| {
                self.query
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .unwrap_or("")
            })
    }
}

impl Keyed for QueryRecord {
    fn same_identity(&self, other: &Self) -> bool {
        self.query == other.query
            && self.variables == other.variables
            && self.headers == other.headers
            && self.extensions == other.extensions
            && self.operation_name == other.operation_name
    }
}
