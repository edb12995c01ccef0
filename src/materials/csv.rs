use std::mem::take;

use lazy_static::lazy_static;
use regex::Regex;

use super::repo_types::Value;

lazy_static! {
    static ref GROUPED_NUMBER: Regex = Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").unwrap();
}

/// Minimal CSV/TSV parser (quotes + CRLF tolerant).
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.trim_start_matches('\u{feff}').chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // doubled quote
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // trailing row without newline, even with unterminated quotes
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// Empty → null, numbers → number, true/false → bool, anything else text.
/// Commas are only accepted as thousands separators (`1,250.50`); `3,5`
/// and `1,2,3` stay text.
pub fn infer_cell(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        return Value::Null;
    }
    let digits = if GROUPED_NUMBER.is_match(s) {
        s.replace(',', "")
    } else {
        s.to_string()
    };
    if let Ok(n) = digits.parse::<f64>() {
        if n.is_finite() && s.chars().any(|c| c.is_ascii_digit()) {
            return Value::Number(n);
        }
    }
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::Text(raw.to_string())
}
