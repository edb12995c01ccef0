use serde::Serialize;

/// One cell of the materials table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        }
    }
}

/// How a column can be used in a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Numeric,
    Other,
}

/// Headers plus rows; every row has one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Rows shorter than the header are padded with nulls, longer ones cut.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Value::Null);
                r
            })
            .collect();
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Numeric when every non-null cell is a number, text when the column
    /// holds any text, otherwise (booleans, all-null) neither.
    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        let mut seen_number = false;
        let mut seen_text = false;
        let mut seen_other = false;
        for v in self.column(idx) {
            match v {
                Value::Null => {}
                Value::Number(_) => seen_number = true,
                Value::Text(_) => seen_text = true,
                Value::Bool(_) => seen_other = true,
            }
        }
        match (seen_number, seen_text, seen_other) {
            (true, false, false) => ColumnKind::Numeric,
            (_, true, _) => ColumnKind::Text,
            (true, false, true) => ColumnKind::Text,
            _ => ColumnKind::Other,
        }
    }

    /// Largest number in a column, if it has any.
    pub fn column_max(&self, idx: usize) -> Option<f64> {
        self.column(idx)
            .filter_map(Value::as_number)
            .filter(|n| !n.is_nan())
            .reduce(f64::max)
    }
}

/// A numeric column and its largest value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericColumn {
    pub name: String,
    pub max: Option<f64>,
}

/// Columns a search can use, split by kind, in table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnManifest {
    pub text: Vec<String>,
    pub numeric: Vec<NumericColumn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    #[test]
    fn rows_are_squared_to_the_header() {
        let t = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![text("x")], vec![text("y"), text("z"), text("extra")]],
        );
        assert_eq!(t.rows[0], vec![text("x"), Value::Null]);
        assert_eq!(t.rows[1].len(), 2);
    }

    #[test]
    fn kinds_follow_non_null_cells() {
        let t = Table::new(
            vec!["num".into(), "txt".into(), "mixed".into(), "flag".into(), "empty".into()],
            vec![
                vec![Value::Number(1.0), text("a"), Value::Number(1.0), Value::Bool(true), Value::Null],
                vec![Value::Null, Value::Null, text("b"), Value::Bool(false), Value::Null],
            ],
        );
        assert_eq!(t.column_kind(0), ColumnKind::Numeric);
        assert_eq!(t.column_kind(1), ColumnKind::Text);
        assert_eq!(t.column_kind(2), ColumnKind::Text);
        assert_eq!(t.column_kind(3), ColumnKind::Other);
        assert_eq!(t.column_kind(4), ColumnKind::Other);
    }

    #[test]
    fn column_max_skips_non_numbers() {
        let t = Table::new(
            vec!["price".into()],
            vec![
                vec![Value::Number(120.0)],
                vec![Value::Null],
                vec![Value::Number(980.5)],
            ],
        );
        assert_eq!(t.column_max(0), Some(980.5));
        assert_eq!(Table::new(vec!["x".into()], vec![vec![Value::Null]]).column_max(0), None);
    }

    #[test]
    fn json_values_convert() {
        assert_eq!(Value::from(serde_json::json!(3)), Value::Number(3.0));
        assert_eq!(Value::from(serde_json::json!("bolt")), text("bolt"));
        assert_eq!(Value::from(serde_json::json!(null)), Value::Null);
        assert_eq!(Value::from(serde_json::json!([1, 2])), text("[1,2]"));
    }

    #[test]
    fn cells_serialize_untagged() {
        let row = vec![Value::Null, Value::Number(2.5), text("nut"), Value::Bool(true)];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"[null,2.5,"nut",true]"#);
    }
}
