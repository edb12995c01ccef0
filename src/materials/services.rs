use regex::RegexBuilder;

use super::repo_types::{ColumnKind, ColumnManifest, NumericColumn, Table};
use crate::error::SearchError;

/// Text term plus inclusive numeric range over two chosen columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub term: Option<String>,
    pub text_column: String,
    pub numeric_column: String,
    pub min: f64,
    pub max: f64,
}

/// Splits the table's columns into text and numeric candidates.
pub fn list_columns(table: &Table) -> ColumnManifest {
    let mut manifest = ColumnManifest::default();
    for (idx, name) in table.columns.iter().enumerate() {
        match table.column_kind(idx) {
            ColumnKind::Text => manifest.text.push(name.clone()),
            ColumnKind::Numeric => manifest.numeric.push(NumericColumn {
                name: name.clone(),
                max: table.column_max(idx),
            }),
            ColumnKind::Other => {}
        }
    }
    manifest
}

/// Rows whose text column contains `term` (case-insensitive, literal) and
/// whose numeric column lies in `[min, max]`, in table order.
///
/// An absent or empty term skips the text filter, and the text column is
/// then not looked at.
pub fn search(table: &Table, query: &SearchQuery) -> Result<Table, SearchError> {
    if query.min.is_nan() || query.max.is_nan() || query.min > query.max {
        return Err(SearchError::InvalidRange {
            min: query.min,
            max: query.max,
        });
    }

    let num_idx = table
        .column_index(&query.numeric_column)
        .ok_or_else(|| SearchError::UnknownColumn(query.numeric_column.clone()))?;
    if table.column_kind(num_idx) != ColumnKind::Numeric {
        return Err(SearchError::NotNumeric(query.numeric_column.clone()));
    }

    let text_filter = match query.term.as_deref().filter(|t| !t.is_empty()) {
        None => None,
        Some(term) => {
            let idx = table
                .column_index(&query.text_column)
                .ok_or_else(|| SearchError::UnknownColumn(query.text_column.clone()))?;
            if table.column_kind(idx) != ColumnKind::Text {
                return Err(SearchError::NotText(query.text_column.clone()));
            }
            let re = RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
                .map_err(|e| SearchError::Pattern(e.to_string()))?;
            Some((idx, re))
        }
    };

    let rows = table
        .rows
        .iter()
        .filter(|row| match &text_filter {
            Some((idx, re)) => row[*idx].as_text().is_some_and(|s| re.is_match(s)),
            None => true,
        })
        .filter(|row| {
            row[num_idx]
                .as_number()
                .is_some_and(|n| n >= query.min && n <= query.max)
        })
        .cloned()
        .collect();

    Ok(Table {
        columns: table.columns.clone(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::repo_types::Value;

    fn fixture() -> Table {
        let row = |name: Option<&str>, price: Option<f64>, grade: &str| {
            vec![
                name.map(|n| Value::Text(n.into())).unwrap_or(Value::Null),
                price.map(Value::Number).unwrap_or(Value::Null),
                Value::Text(grade.into()),
                Value::Bool(true),
            ]
        };
        Table::new(
            vec!["name".into(), "price".into(), "grade".into(), "stocked".into()],
            vec![
                row(Some("Hex BOLT M8"), Some(120.0), "A"),
                row(Some("Washer"), Some(150.0), "B"),
                row(Some("Carriage bolt"), Some(500.0), "A"),
                row(Some("bolt cutter"), Some(900.0), "C"),
                row(None, Some(200.0), "B"),
                row(Some("Anchor bolt"), None, "A"),
                row(Some("Eye bolt"), Some(100.0), "B"),
                row(Some("Nut"), Some(99.99), "A"),
            ],
        )
    }

    fn query(term: Option<&str>, min: f64, max: f64) -> SearchQuery {
        SearchQuery {
            term: term.map(str::to_string),
            text_column: "name".into(),
            numeric_column: "price".into(),
            min,
            max,
        }
    }

    fn names(t: &Table) -> Vec<&str> {
        t.rows.iter().map(|r| r[0].as_text().unwrap_or("<null>")).collect()
    }

    #[test]
    fn term_and_range_together() {
        let out = search(&fixture(), &query(Some("bolt"), 100.0, 500.0)).unwrap();
        assert_eq!(names(&out), vec!["Hex BOLT M8", "Carriage bolt", "Eye bolt"]);
        assert_eq!(out.columns, fixture().columns);
    }

    #[test]
    fn empty_term_filters_on_price_only() {
        let table = fixture();
        let none = search(&table, &query(None, 100.0, 500.0)).unwrap();
        let empty = search(&table, &query(Some(""), 100.0, 500.0)).unwrap();
        assert_eq!(none, empty);
        assert_eq!(
            names(&none),
            vec!["Hex BOLT M8", "Washer", "Carriage bolt", "<null>", "Eye bolt"]
        );
    }

    #[test]
    fn empty_term_ignores_the_text_column() {
        let mut q = query(None, 0.0, 1000.0);
        q.text_column = "does-not-exist".into();
        assert_eq!(search(&fixture(), &q).unwrap().nrows(), 7);
    }

    #[test]
    fn term_is_literal_not_a_pattern() {
        let table = Table::new(
            vec!["name".into(), "price".into()],
            vec![
                vec![Value::Text("bolt (M8)".into()), Value::Number(1.0)],
                vec![Value::Text("bolt M8".into()), Value::Number(1.0)],
            ],
        );
        let out = search(&table, &query(Some("(m8)"), 0.0, 10.0)).unwrap();
        assert_eq!(names(&out), vec!["bolt (M8)"]);
    }

    #[test]
    fn no_match_is_an_empty_table_not_an_error() {
        let out = search(&fixture(), &query(Some("rivet"), 0.0, 1000.0)).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.columns.len(), 4);
    }

    #[test]
    fn bad_selection_is_an_error() {
        let table = fixture();

        let mut q = query(Some("bolt"), 0.0, 10.0);
        q.numeric_column = "weight".into();
        assert_eq!(search(&table, &q), Err(SearchError::UnknownColumn("weight".into())));

        let mut q = query(Some("bolt"), 0.0, 10.0);
        q.numeric_column = "grade".into();
        assert_eq!(search(&table, &q), Err(SearchError::NotNumeric("grade".into())));

        let mut q = query(Some("bolt"), 0.0, 10.0);
        q.text_column = "price".into();
        assert_eq!(search(&table, &q), Err(SearchError::NotText("price".into())));

        assert!(matches!(
            search(&table, &query(None, 10.0, 1.0)),
            Err(SearchError::InvalidRange { .. })
        ));
        assert!(search(&table, &query(None, f64::NAN, 1.0)).is_err());
    }

    #[test]
    fn repeated_search_is_identical() {
        let table = fixture();
        let q = query(Some("BoLt"), 100.0, 900.0);
        assert_eq!(search(&table, &q).unwrap(), search(&table, &q).unwrap());
    }

    #[test]
    fn columns_are_partitioned() {
        let manifest = list_columns(&fixture());
        assert_eq!(manifest.text, vec!["name", "grade"]);
        assert_eq!(
            manifest.numeric,
            vec![NumericColumn {
                name: "price".into(),
                max: Some(900.0)
            }]
        );
    }
}
