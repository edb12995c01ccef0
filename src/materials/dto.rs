use serde::{Deserialize, Serialize};

use crate::materials::repo_types::{ColumnManifest, Value};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub term: Option<String>,
    pub search_column: String,
    pub price_column: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>, // defaults to the price column's max
}

/// Criteria actually applied, echoed back for display.
#[derive(Debug, Serialize, PartialEq)]
pub struct SearchCriteria {
    pub search_column: String,
    pub price_column: String,
    pub term: Option<String>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub criteria: SearchCriteria,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub count: usize,
    /// Set when the search could not be applied; `rows` is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    #[serde(flatten)]
    pub manifest: ColumnManifest,
    pub rows: usize,
}
