//! Shared types for query parameters and results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

/// A positional query parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

/// A single cell as read from a backend, before JSON conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Fixed-point value in its textual form, e.g. `"1234.50"`
    Decimal(String),
    Text(String),
}

impl CellValue {
    /// Convert to a JSON scalar.
    ///
    /// Decimals become floats since JSON has no fixed-point type. Non-finite
    /// floats have no JSON representation and become null.
    pub fn into_json(self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(b),
            CellValue::Int(i) => Value::Number(Number::from(i)),
            CellValue::Float(f) => float_to_json(f),
            CellValue::Decimal(text) => match text.trim().parse::<f64>() {
                Ok(f) => float_to_json(f),
                Err(_) => {
                    tracing::warn!(value = %text, "Unparseable decimal value, emitting null");
                    Value::Null
                }
            },
            CellValue::Text(s) => Value::String(s),
        }
    }
}

fn float_to_json(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Rows as returned by a backend: column names from the result descriptor
/// plus one vector of cells per row, in descriptor order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RowSet {
    /// Materialize every row into a [`ResultRow`] keyed by column name.
    ///
    /// A repeated column name keeps the last value. Cells past the end of the
    /// column list are dropped and missing cells are left out of the row.
    pub fn into_result_rows(self) -> Vec<ResultRow> {
        let columns = self.columns;

        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                tracing::warn!(column = %name, "Duplicate column name, keeping the last value");
            }
        }

        self.rows
            .into_iter()
            .enumerate()
            .map(|(index, cells)| {
                if cells.len() != columns.len() {
                    tracing::warn!(
                        row = index,
                        cells = cells.len(),
                        columns = columns.len(),
                        "Row width does not match column list"
                    );
                }
                let map = columns
                    .iter()
                    .cloned()
                    .zip(cells.into_iter().map(CellValue::into_json))
                    .collect();
                ResultRow(map)
            })
            .collect()
    }
}

/// One result row as a JSON object of column name to scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRow(pub Map<String, Value>);

impl ResultRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn test_decimal_becomes_float() {
        let value = CellValue::Decimal("1234.50".to_string()).into_json();
        assert!(value.is_f64());
        assert_eq!(value, json!(1234.5));
    }

    #[test]
    fn test_scalars_convert() {
        assert_eq!(CellValue::Null.into_json(), Value::Null);
        assert_eq!(CellValue::Bool(true).into_json(), json!(true));
        assert_eq!(CellValue::Int(42).into_json(), json!(42));
        assert_eq!(CellValue::Text("North".into()).into_json(), json!("North"));
        assert_eq!(CellValue::Float(f64::NAN).into_json(), Value::Null);
        assert_eq!(CellValue::Decimal("n/a".into()).into_json(), Value::Null);
    }

    #[test]
    fn test_rowset_materializes_every_column() {
        let rows = RowSet {
            columns: vec!["RegionName".into(), "TotalSales".into(), "TotalUnitsSold".into()],
            rows: vec![
                vec![
                    CellValue::Text("North".into()),
                    CellValue::Decimal("100.25".into()),
                    CellValue::Int(7),
                ],
                vec![CellValue::Text("South".into()), CellValue::Null, CellValue::Int(0)],
            ],
        }
        .into_result_rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0].get("TotalSales"), Some(&json!(100.25)));
        assert_eq!(rows[1].get("TotalSales"), Some(&Value::Null));
        assert_eq!(
            serde_json::to_value(&rows[0]).unwrap(),
            json!({"RegionName": "North", "TotalSales": 100.25, "TotalUnitsSold": 7})
        );
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_rowset_warns_on_duplicate_columns_and_width_mismatch() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();

        let rows = tracing::subscriber::with_default(subscriber, || {
            RowSet {
                columns: vec!["Total".into(), "Total".into()],
                rows: vec![
                    vec![CellValue::Int(1), CellValue::Int(2)],
                    vec![CellValue::Int(3)],
                ],
            }
            .into_result_rows()
        });

        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0].get("Total"), Some(&json!(2)));
        assert_eq!(rows[1].get("Total"), Some(&json!(3)));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Duplicate column name"));
        assert!(output.contains("Row width does not match column list"));
    }

    #[test]
    fn test_sql_param_conversions() {
        assert_eq!(SqlParam::from(10), SqlParam::Int(10));
        assert_eq!(SqlParam::from("North"), SqlParam::Text("North".into()));
    }
}
