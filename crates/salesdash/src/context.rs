//! Run-scoped state shared by the sequencer and the teardown handler

use crate::publish::StaticServer;
use chrono::{DateTime, Local};
use salesdash_container::{CommandRunner, DockerCli};
use salesdash_core::LaunchConfig;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Provisioning progress; only ever moves forward (or to `Failed`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineState {
    NetworkPending,
    DbStarting,
    DbReady,
    SchemaReady,
    DataLoaded,
    AppStarting,
    AppReady,
    ContentFetched,
    Published,
    Running,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::NetworkPending => "network-pending",
            PipelineState::DbStarting => "db-starting",
            PipelineState::DbReady => "db-ready",
            PipelineState::SchemaReady => "schema-ready",
            PipelineState::DataLoaded => "data-loaded",
            PipelineState::AppStarting => "app-starting",
            PipelineState::AppReady => "app-ready",
            PipelineState::ContentFetched => "content-fetched",
            PipelineState::Published => "published",
            PipelineState::Running => "running",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Resources acquired so far, in acquisition order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunningServiceSet {
    network: Option<String>,
    services: Vec<String>,
}

impl RunningServiceSet {
    pub fn record_network(&mut self, name: impl Into<String>) {
        self.network = Some(name.into());
    }

    pub fn record_service(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.services.contains(&name) {
            self.services.push(name);
        }
    }

    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    /// Started containers, oldest first
    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn is_empty(&self) -> bool {
        self.network.is_none() && self.services.is_empty()
    }

    /// Everything acquired, network first
    pub fn names(&self) -> Vec<String> {
        self.network
            .iter()
            .chain(self.services.iter())
            .cloned()
            .collect()
    }

    /// Hand everything to the caller and leave the set empty
    pub fn take(&mut self) -> RunningServiceSet {
        std::mem::take(self)
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Vec<String>) {
        (self.network, self.services)
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub started_at: DateTime<Local>,
    pub product_count: Option<u64>,
    pub sales_count: Option<u64>,
    pub expected_products: Option<u64>,
    pub expected_sales: Option<u64>,
    pub artifact: Option<PathBuf>,
    pub artifact_bytes: usize,
    pub fetch_attempts: u32,
    pub db_ready_attempts: u32,
}

impl Default for LaunchReport {
    fn default() -> Self {
        Self {
            started_at: Local::now(),
            product_count: None,
            sales_count: None,
            expected_products: None,
            expected_sales: None,
            artifact: None,
            artifact_bytes: 0,
            fetch_attempts: 0,
            db_ready_attempts: 0,
        }
    }
}

/// Explicit context threaded through every stage
pub struct LaunchContext {
    pub config: LaunchConfig,
    pub runtime: DockerCli,
    pub running: RunningServiceSet,
    pub server: Option<StaticServer>,
    pub report: LaunchReport,
    state: PipelineState,
}

impl LaunchContext {
    pub fn new(config: LaunchConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let runtime = DockerCli::new(config.runtime.clone(), runner);
        Self {
            config,
            runtime,
            running: RunningServiceSet::default(),
            server: None,
            report: LaunchReport::default(),
            state: PipelineState::NetworkPending,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            next == PipelineState::Failed || next >= self.state,
            "state moved backwards: {} -> {}",
            self.state,
            next
        );
        tracing::info!("state: {} -> {}", self.state, next);
        self.state = next;
    }
}
