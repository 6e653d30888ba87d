use crate::pipeline::Stage;
use crate::teardown::TeardownReport;
use salesdash_container::ContainerError;
use salesdash_core::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("CSV file not found: {0}")]
    CsvNotFound(PathBuf),

    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(
        "Row count mismatch in {table}: {expected} rows in the CSV, {actual} loaded\n\nHint:\n  • Check the CSV for blank or malformed lines\n  • Set row_counts: warn to continue anyway"
    )]
    RowCountMismatch {
        table: String,
        expected: u64,
        actual: u64,
    },

    #[error("Unexpected output from `{query}`: {output:?}")]
    UnexpectedOutput { query: String, output: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to start the static server on {addr}: {source}")]
    Publish {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LaunchError>;

/// A provisioning run that stopped at `stage`
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineFailure {
    pub stage: Stage,
    /// Resources that had been acquired when the stage failed
    pub started: Vec<String>,
    #[source]
    pub source: LaunchError,
    /// Filled in once the cleanup scope has run
    pub teardown: TeardownReport,
}

impl PipelineFailure {
    pub fn is_interrupted(&self) -> bool {
        matches!(self.source, LaunchError::Interrupted)
    }

    /// Failure after an earlier stage had already succeeded
    pub fn is_partial(&self) -> bool {
        self.stage != Stage::Network && !self.is_interrupted()
    }

    pub fn is_readiness_timeout(&self) -> bool {
        matches!(
            self.source,
            LaunchError::Container(ContainerError::ReadinessTimeout { .. })
        )
    }
}
