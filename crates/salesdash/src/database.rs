//! PostgreSQL operations, all executed inside the database container

use crate::error::{LaunchError, Result};
use salesdash_container::{DockerCli, poll};
use salesdash_core::{DatabaseConfig, RetryPolicy};
use std::path::Path;

/// Tables, keys and indexes for the dashboard; safe to apply repeatedly
pub const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS products (
    product_id INTEGER PRIMARY KEY,
    product_name VARCHAR(255) NOT NULL
);
CREATE TABLE IF NOT EXISTS sales_data (
    id SERIAL PRIMARY KEY,
    product_id INTEGER NOT NULL REFERENCES products(product_id),
    date DATE NOT NULL,
    sales NUMERIC(12, 2) NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sales_data_product_id ON sales_data(product_id);
CREATE INDEX IF NOT EXISTS idx_sales_data_date ON sales_data(date);
";

/// A table fed from a CSV file with a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLoad {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// `product_id,product_name`
pub const PRODUCTS: TableLoad = TableLoad {
    table: "products",
    columns: &["product_id", "product_name"],
};

/// `product_id,date,sales`; every product_id must already be in `products`
pub const SALES: TableLoad = TableLoad {
    table: "sales_data",
    columns: &["product_id", "date", "sales"],
};

impl TableLoad {
    pub fn copy_sql(&self) -> String {
        format!(
            "COPY {}({}) FROM STDIN WITH (FORMAT csv, HEADER true)",
            self.table,
            self.columns.join(", ")
        )
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.table)
    }
}

/// Handle on the database container
pub struct Database<'a> {
    runtime: &'a DockerCli,
    config: &'a DatabaseConfig,
}

impl<'a> Database<'a> {
    pub fn new(runtime: &'a DockerCli, config: &'a DatabaseConfig) -> Self {
        Self { runtime, config }
    }

    fn psql<'s>(&'s self, sql: &'s str) -> [&'s str; 10] {
        [
            "psql",
            "-v",
            "ON_ERROR_STOP=1",
            "-U",
            self.config.user.as_str(),
            "-d",
            self.config.name.as_str(),
            "-tA",
            "-c",
            sql,
        ]
    }

    /// Liveness probe over TCP
    ///
    /// The image's init-time server listens on the unix socket only, so a TCP
    /// answer means the final server is up.
    pub async fn is_ready(&self) -> bool {
        let port = self.config.container_port.to_string();
        self.runtime
            .probe_exec(
                &self.config.container,
                &[
                    "pg_isready",
                    "-h",
                    "127.0.0.1",
                    "-p",
                    port.as_str(),
                    "-U",
                    self.config.user.as_str(),
                    "-d",
                    self.config.name.as_str(),
                ],
            )
            .await
    }

    /// Block until the probe passes; returns the number of attempts used
    pub async fn wait_ready(&self, policy: &RetryPolicy) -> Result<u32> {
        let readiness = poll(policy, move || self.is_ready()).await;
        let attempts = readiness.attempts();
        readiness.into_result(&self.config.container)?;
        Ok(attempts)
    }

    pub async fn apply_schema(&self) -> Result<()> {
        self.runtime
            .exec(&self.config.container, &self.psql(SCHEMA_SQL))
            .await?;
        Ok(())
    }

    /// Stream `csv` into `load.table` with COPY
    pub async fn bulk_load(&self, load: &TableLoad, csv: &Path) -> Result<()> {
        if !csv.is_file() {
            return Err(LaunchError::CsvNotFound(csv.to_path_buf()));
        }
        let sql = load.copy_sql();
        self.runtime
            .exec_with_stdin(&self.config.container, &self.psql(&sql), csv)
            .await?;
        Ok(())
    }

    pub async fn row_count(&self, load: &TableLoad) -> Result<u64> {
        let sql = load.count_sql();
        let output = self
            .runtime
            .exec(&self.config.container, &self.psql(&sql))
            .await?;
        let value = output.stdout.trim();
        value
            .parse::<u64>()
            .map_err(|_| LaunchError::UnexpectedOutput {
                query: sql.clone(),
                output: value.to_string(),
            })
    }
}

/// Data records in a CSV file, header excluded
///
/// Parsed the way `COPY ... (FORMAT csv)` reads it: a quoted field may span
/// lines and blank lines are skipped.
pub async fn count_csv_rows(path: &Path) -> Result<u64> {
    if !path.is_file() {
        return Err(LaunchError::CsvNotFound(path.to_path_buf()));
    }
    let content = tokio::fs::read(path).await?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_slice());

    let mut rows = 0;
    for record in reader.records() {
        record.map_err(|source| LaunchError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        rows += 1;
    }
    Ok(rows)
}
