//! SQL Server backend over ODBC
//!
//! Every call opens its own connection on the blocking pool and closes it
//! when the result has been read.

use crate::backend::{Backend, Dialect};
use crate::config::ConnectTimeouts;
use crate::connection::{NormalizedConnectionConfig, mask_password};
use crate::error::{BackendError, FailureKind, Result, classify_sqlstate};
use crate::types::{CellValue, RowSet, SqlParam};
use async_trait::async_trait;
use odbc_api::buffers::{BufferDesc, ColumnarAnyBuffer};
use odbc_api::parameter::InputParameter;
use odbc_api::{
    ColumnDescription, ConnectionOptions, Cursor, DataType, Environment, IntoParameter,
    ResultSetMetadata,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

const BATCH_SIZE: usize = 1000;
const MAX_TEXT_LEN: usize = 4000;

/// How a column's text should be reinterpreted once fetched
#[derive(Debug, Clone, Copy)]
enum ColumnKind {
    Decimal,
    Integer,
    Float,
    Bit,
    Text,
}

impl From<DataType> for ColumnKind {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::Decimal { .. } | DataType::Numeric { .. } => ColumnKind::Decimal,
            DataType::Integer | DataType::SmallInt | DataType::TinyInt | DataType::BigInt => {
                ColumnKind::Integer
            }
            DataType::Real | DataType::Float { .. } | DataType::Double => ColumnKind::Float,
            DataType::Bit => ColumnKind::Bit,
            _ => ColumnKind::Text,
        }
    }
}

pub struct OdbcBackend {
    conn_str: Arc<SecretString>,
    timeouts: ConnectTimeouts,
}

impl OdbcBackend {
    pub fn new(config: NormalizedConnectionConfig, timeouts: ConnectTimeouts) -> Result<Self> {
        Ok(Self {
            conn_str: Arc::new(SecretString::from(config.expose_secret().to_string())),
            timeouts,
        })
    }
}

#[async_trait]
impl Backend for OdbcBackend {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    async fn fetch(&self, sql: &str, params: &[SqlParam]) -> std::result::Result<RowSet, BackendError> {
        let conn_str = Arc::clone(&self.conn_str);
        let timeouts = self.timeouts;
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || run_blocking(&conn_str, timeouts, &sql, &params))
            .await
            .map_err(|e| BackendError::permanent(format!("query task failed: {e}")))?
    }
}

fn run_blocking(
    conn_str: &SecretString,
    timeouts: ConnectTimeouts,
    sql: &str,
    params: &[SqlParam],
) -> std::result::Result<RowSet, BackendError> {
    let env = Environment::new().map_err(|e| from_odbc("ODBC environment error", e))?;

    let conn = env
        .connect_with_connection_string(
            conn_str.expose_secret(),
            ConnectionOptions {
                login_timeout_sec: Some(timeouts.connect.as_secs() as u32),
                ..Default::default()
            },
        )
        .map_err(|e| from_odbc("connection failed", e))?;

    let bound: Vec<Box<dyn InputParameter>> = params
        .iter()
        .map(|param| -> Box<dyn InputParameter> {
            match param {
                SqlParam::Int(i) => Box::new(*i),
                SqlParam::Text(s) => Box::new(s.clone().into_parameter()),
            }
        })
        .collect();

    let cursor = conn
        .execute(sql, bound.as_slice(), Some(timeouts.query.as_secs() as usize))
        .map_err(|e| from_odbc("query execution failed", e))?;

    let Some(mut cursor) = cursor else {
        return Ok(RowSet::default());
    };

    let num_cols = cursor
        .num_result_cols()
        .map_err(|e| from_odbc("failed to get column count", e))? as usize;

    let mut columns = Vec::with_capacity(num_cols);
    let mut kinds = Vec::with_capacity(num_cols);
    for i in 1..=num_cols as u16 {
        let mut desc = ColumnDescription::default();
        cursor
            .describe_col(i, &mut desc)
            .map_err(|e| from_odbc("failed to describe column", e))?;
        let name = desc
            .name_to_string()
            .map_err(|e| BackendError::permanent(format!("failed to decode column name: {e}")))?;
        columns.push(name);
        kinds.push(ColumnKind::from(desc.data_type));
    }

    // Fetch everything as text; the driver renders decimals losslessly that way
    let descs = (0..num_cols).map(|_| BufferDesc::Text {
        max_str_len: MAX_TEXT_LEN,
    });
    let buffer = ColumnarAnyBuffer::try_from_descs(BATCH_SIZE, descs)
        .map_err(|e| from_odbc("failed to allocate buffer", e))?;
    let mut block = cursor
        .bind_buffer(buffer)
        .map_err(|e| from_odbc("failed to bind buffer", e))?;

    let mut rows = Vec::new();
    while let Some(batch) = block.fetch().map_err(|e| from_odbc("fetch failed", e))? {
        for row_idx in 0..batch.num_rows() {
            let mut row = Vec::with_capacity(num_cols);
            for (col_idx, kind) in kinds.iter().enumerate() {
                let text = batch
                    .column(col_idx)
                    .as_text_view()
                    .and_then(|view| view.get(row_idx))
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned());
                row.push(decode_cell(*kind, text));
            }
            rows.push(row);
        }
    }

    Ok(RowSet { columns, rows })
}

fn decode_cell(kind: ColumnKind, text: Option<String>) -> CellValue {
    let Some(text) = text else {
        return CellValue::Null;
    };
    match kind {
        ColumnKind::Decimal => CellValue::Decimal(text),
        ColumnKind::Integer => text
            .trim()
            .parse()
            .map(CellValue::Int)
            .unwrap_or(CellValue::Text(text)),
        ColumnKind::Float => text
            .trim()
            .parse()
            .map(CellValue::Float)
            .unwrap_or(CellValue::Text(text)),
        ColumnKind::Bit => CellValue::Bool(text.trim() == "1"),
        ColumnKind::Text => CellValue::Text(text),
    }
}

/// Classify by SQLSTATE when the driver reported one. Driver messages can
/// echo the connection string, so they are masked before they travel on.
fn from_odbc(context: &str, err: odbc_api::Error) -> BackendError {
    let kind = match &err {
        odbc_api::Error::Diagnostics { record, .. } => classify_sqlstate(record.state.as_str()),
        _ => FailureKind::Permanent,
    };
    BackendError {
        kind,
        message: mask_password(&format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_columns_keep_text() {
        let cell = decode_cell(ColumnKind::Decimal, Some("1234.50".into()));
        assert_eq!(cell, CellValue::Decimal("1234.50".into()));
        assert_eq!(cell.into_json(), serde_json::json!(1234.5));
    }

    #[test]
    fn test_typed_columns_decode() {
        assert_eq!(decode_cell(ColumnKind::Integer, Some("42".into())), CellValue::Int(42));
        assert_eq!(decode_cell(ColumnKind::Float, Some("1.5".into())), CellValue::Float(1.5));
        assert_eq!(decode_cell(ColumnKind::Bit, Some("1".into())), CellValue::Bool(true));
        assert_eq!(decode_cell(ColumnKind::Text, None), CellValue::Null);
    }

    #[test]
    fn test_data_type_mapping() {
        assert!(matches!(
            ColumnKind::from(DataType::Decimal { precision: 15, scale: 2 }),
            ColumnKind::Decimal
        ));
        assert!(matches!(ColumnKind::from(DataType::BigInt), ColumnKind::Integer));
        assert!(matches!(ColumnKind::from(DataType::Double), ColumnKind::Float));
    }
}
