//! Shared test utilities
//!
//! A seeded SQLite sales database and a scripted backend for exercising the
//! executor without a server.

use crate::backend::{Backend, Dialect};
use crate::error::BackendError;
use crate::schema::SQLITE_DDL;
use crate::types::{CellValue, RowSet, SqlParam};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use tokio::time::Instant;

pub const REGIONS: &[&str] = &["North", "South", "East", "West"];
pub const CUSTOMER_COUNT: i64 = 12;

const PRODUCTS: &[(&str, &str, f64, &str)] = &[
    ("Trail Runner", "Footwear", 89.99, "Outdoor"),
    ("City Sneaker", "Footwear", 64.50, "Urban"),
    ("Rain Shell", "Apparel", 120.00, "Outdoor"),
    ("Wool Socks", "Accessories", 12.25, "Essentials"),
    ("Daypack", "Accessories", 45.00, "Outdoor"),
];
const CUSTOMER_TYPES: &[&str] = &["Retail", "Wholesale", "Distributor"];
const CHANNELS: &[&str] = &["Online", "Retail Store", "Distributor"];

/// Total spent by seeded customer `id` (1-based). Strictly increasing in `id`.
pub fn customer_total(id: i64) -> f64 {
    150.0 * id as f64 + 10.25
}

/// Create `sales.db` under `dir` with the sales schema and a small
/// deterministic data set, returning its `sqlite://` URL.
///
/// Four regions with three customers each; customer `n` is named
/// `Customer {n:02}`, places two orders and spends [`customer_total`]`(n)`.
pub async fn seed_sales_database(dir: &Path) -> Result<String, sqlx::Error> {
    let path = dir.join("sales.db");
    let mut conn = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete)
        .connect()
        .await?;

    sqlx::raw_sql(SQLITE_DDL).execute(&mut conn).await?;

    let mut tx = conn.begin().await?;

    for (i, region) in REGIONS.iter().enumerate() {
        sqlx::query("INSERT INTO SalesRegions VALUES (?, ?, ?, ?)")
            .bind(i as i64 + 1)
            .bind(*region)
            .bind(format!("{region} Manager"))
            .bind(format!("{region} HQ"))
            .execute(&mut *tx)
            .await?;
    }

    for (i, (name, category, price, line)) in PRODUCTS.iter().enumerate() {
        sqlx::query("INSERT INTO Products VALUES (?, ?, ?, ?, ?, ?)")
            .bind(i as i64 + 1)
            .bind(*name)
            .bind(*category)
            .bind(*price)
            .bind(*line)
            .bind("2023-01-01")
            .execute(&mut *tx)
            .await?;
    }

    let mut sales_id = 1;
    for id in 1..=CUSTOMER_COUNT {
        let region_id = (id - 1) % REGIONS.len() as i64 + 1;
        sqlx::query("INSERT INTO Customers VALUES (?, ?, ?, ?, ?, ?, ?)")
            .bind(id)
            .bind(format!("Customer {id:02}"))
            .bind(format!("Contact {id:02}"))
            .bind(CUSTOMER_TYPES[(id as usize) % CUSTOMER_TYPES.len()])
            .bind(region_id)
            .bind("South Africa")
            .bind("Cape Town")
            .execute(&mut *tx)
            .await?;

        // Two orders per customer: 100n + 10.25 and 50n
        let amounts = [100.0 * id as f64 + 10.25, 50.0 * id as f64];
        for (k, amount) in amounts.iter().enumerate() {
            let k = k as i64;
            let product_id = (id + k) % PRODUCTS.len() as i64 + 1;
            let month = (id * 2 + k) % 12 + 1;
            sqlx::query("INSERT INTO SalesData VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)")
                .bind(sales_id)
                .bind(product_id)
                .bind(id)
                .bind(format!("2024-{month:02}-15"))
                .bind(k + 1)
                .bind(id + k)
                .bind(*amount)
                .bind(0.0)
                .bind(CHANNELS[(sales_id as usize) % CHANNELS.len()])
                .bind(Option::<i64>::None)
                .execute(&mut *tx)
                .await?;
            sales_id += 1;
        }
    }

    tx.commit().await?;
    conn.close().await?;

    Ok(format!("sqlite://{}", path.display()))
}

/// What a [`ScriptedBackend`] call does once its queue runs dry
#[derive(Debug, Clone)]
enum Fallback {
    Respond(Result<RowSet, BackendError>),
    Hang,
}

/// Backend that replays queued outcomes and records every call.
pub struct ScriptedBackend {
    dialect: Dialect,
    outcomes: Mutex<VecDeque<Result<RowSet, BackendError>>>,
    fallback: Fallback,
    calls: Mutex<Vec<(Instant, String, Vec<SqlParam>)>>,
}

impl ScriptedBackend {
    /// Replay `outcomes` in order, then return an empty row set.
    pub fn new(outcomes: Vec<Result<RowSet, BackendError>>) -> Self {
        Self {
            dialect: Dialect::Sqlite,
            outcomes: Mutex::new(outcomes.into()),
            fallback: Fallback::Respond(Ok(RowSet::default())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with `error`.
    pub fn always(error: BackendError) -> Self {
        Self {
            fallback: Fallback::Respond(Err(error)),
            ..Self::new(Vec::new())
        }
    }

    /// Never complete a call.
    pub fn hanging() -> Self {
        Self {
            fallback: Fallback::Hang,
            ..Self::new(Vec::new())
        }
    }

    /// One-row result with the given column/value pairs
    pub fn single_row(cells: Vec<(&str, CellValue)>) -> RowSet {
        let (columns, row) = cells
            .into_iter()
            .map(|(name, cell)| (name.to_string(), cell))
            .unzip();
        RowSet {
            columns,
            rows: vec![row],
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Instants at which each call started
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .map(|c| c.iter().map(|(at, _, _)| *at).collect())
            .unwrap_or_default()
    }

    /// Statement and parameters of the most recent call
    pub fn last_call(&self) -> Option<(String, Vec<SqlParam>)> {
        self.calls
            .lock()
            .ok()
            .and_then(|c| c.last().map(|(_, sql, params)| (sql.clone(), params.clone())))
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn fetch(&self, sql: &str, params: &[SqlParam]) -> Result<RowSet, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((Instant::now(), sql.to_string(), params.to_vec()));
        }

        let next = self.outcomes.lock().ok().and_then(|mut q| q.pop_front());
        match (next, &self.fallback) {
            (Some(outcome), _) => outcome,
            (None, Fallback::Respond(outcome)) => outcome.clone(),
            (None, Fallback::Hang) => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_backend_replays_then_falls_back() {
        let backend = ScriptedBackend::new(vec![Err(BackendError::transient("down"))]);

        assert!(backend.fetch("SELECT 1", &[]).await.is_err());
        assert_eq!(backend.fetch("SELECT 2", &[]).await.unwrap(), RowSet::default());
        assert_eq!(backend.call_count(), 2);
        assert_eq!(backend.last_call().unwrap().0, "SELECT 2");
    }

    #[test]
    fn test_customer_totals_are_distinct() {
        let totals: Vec<f64> = (1..=CUSTOMER_COUNT).map(customer_total).collect();
        assert!(totals.windows(2).all(|w| w[0] < w[1]));
    }
}
