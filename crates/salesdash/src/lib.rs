//! Throwaway sales dashboard stack
//!
//! Provisions a PostgreSQL container, loads the product and sales CSVs,
//! starts the dashboard app against it, and republishes the rendered page
//! from a local static server until interrupted.

pub mod context;
pub mod database;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod publish;
pub mod shutdown;
pub mod teardown;

pub use context::{LaunchContext, LaunchReport, PipelineState, RunningServiceSet};
pub use error::{LaunchError, PipelineFailure};
pub use pipeline::{Stage, launch, provision};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use teardown::{TeardownReport, teardown, teardown_resources};
