//! Provisioning sequencer
//!
//! Seven stages run strictly one after another. A failing stage stops the
//! run; [`launch`] then tears down whatever had been acquired. An interrupt is
//! checked before each stage and raced against the stage in progress.

use crate::context::{LaunchContext, PipelineState};
use crate::database::{self, Database, PRODUCTS, SALES, TableLoad};
use crate::error::{LaunchError, PipelineFailure, Result};
use crate::fetch::{fetch_dashboard, http_client, write_artifact};
use crate::publish::StaticServer;
use crate::shutdown::Shutdown;
use crate::teardown::{TeardownReport, teardown};
use colored::Colorize;
use salesdash_container::{NetworkStatus, ensure_ports_available};
use salesdash_core::RowCountPolicy;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Network,
    Database,
    Schema,
    Load,
    App,
    Fetch,
    Publish,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Network,
        Stage::Database,
        Stage::Schema,
        Stage::Load,
        Stage::App,
        Stage::Fetch,
        Stage::Publish,
    ];

    /// 1-based position in the pipeline
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Network => "network",
            Stage::Database => "database",
            Stage::Schema => "schema",
            Stage::Load => "load",
            Stage::App => "app",
            Stage::Fetch => "fetch",
            Stage::Publish => "publish",
        }
    }

    fn headline(self) -> &'static str {
        match self {
            Stage::Network => "Preparing network",
            Stage::Database => "Starting database",
            Stage::Schema => "Applying schema",
            Stage::Load => "Loading CSV data",
            Stage::App => "Starting dashboard app",
            Stage::Fetch => "Fetching dashboard",
            Stage::Publish => "Publishing static copy",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Run every stage, stopping at the first failure or interrupt
///
/// Does not clean up: resources acquired before a failure stay recorded in
/// `ctx.running` for [`teardown`].
pub async fn provision(
    ctx: &mut LaunchContext,
    shutdown: &Shutdown,
) -> std::result::Result<(), PipelineFailure> {
    for stage in Stage::ALL {
        let outcome = if shutdown.is_triggered() {
            Err(LaunchError::Interrupted)
        } else {
            println!();
            println!(
                "{} [{}/{}] {}",
                "▶".blue(),
                stage.ordinal(),
                Stage::ALL.len(),
                stage.headline().bold()
            );
            tokio::select! {
                result = run_stage(ctx, stage) => result,
                _ = shutdown.wait() => Err(LaunchError::Interrupted),
            }
        };

        if let Err(source) = outcome {
            if matches!(source, LaunchError::Interrupted) {
                println!("  ℹ interrupted");
                adopt_unrecorded(ctx, stage).await;
            } else {
                println!("  {} {}", "✗".red(), source);
            }
            ctx.advance(PipelineState::Failed);
            return Err(PipelineFailure {
                stage,
                started: ctx.running.names(),
                source,
                teardown: TeardownReport::default(),
            });
        }
    }
    Ok(())
}

/// Provision, keep running until interrupted, then tear down
///
/// Every path out of here after the first acquired resource goes through
/// [`teardown`]. Returns the cleanup report of the interrupted steady state.
pub async fn launch(
    ctx: &mut LaunchContext,
    shutdown: &Shutdown,
) -> std::result::Result<TeardownReport, PipelineFailure> {
    if let Err(mut failure) = provision(ctx, shutdown).await {
        failure.teardown = teardown(ctx).await;
        return Err(failure);
    }

    ctx.advance(PipelineState::Running);
    print_summary(ctx);

    shutdown.wait().await;
    println!();
    println!("{}", "Interrupt received, shutting down".yellow());
    Ok(teardown(ctx).await)
}

async fn run_stage(ctx: &mut LaunchContext, stage: Stage) -> Result<()> {
    match stage {
        Stage::Network => network(ctx).await,
        Stage::Database => start_database(ctx).await,
        Stage::Schema => schema(ctx).await,
        Stage::Load => load(ctx).await,
        Stage::App => start_app(ctx).await,
        Stage::Fetch => fetch(ctx).await,
        Stage::Publish => publish(ctx).await,
    }
}

async fn network(ctx: &mut LaunchContext) -> Result<()> {
    if ctx.config.preflight_ports {
        ensure_ports_available(&ctx.config.host_ports())?;
        println!("  ✓ host ports are free");
    }

    let name = ctx.config.network.clone();
    match ctx.runtime.ensure_network(&name).await? {
        NetworkStatus::Created => println!("  ✓ network {} created", name.cyan()),
        NetworkStatus::AlreadyExisted => println!("  ℹ network {} already exists", name.cyan()),
    }
    ctx.running.record_network(name);
    Ok(())
}

async fn start_database(ctx: &mut LaunchContext) -> Result<()> {
    ctx.advance(PipelineState::DbStarting);
    let service = ctx.config.database_service();
    let id = ctx.runtime.run_service(&service).await?;
    ctx.running.record_service(&service.name);
    println!("  ✓ container {} started ({})", service.name.cyan(), short_id(&id));

    let policy = ctx.config.readiness.database;
    println!(
        "  … waiting for PostgreSQL (up to {} attempts, {}s)",
        policy.max_attempts,
        policy.max_wait().as_secs()
    );
    let attempts = Database::new(&ctx.runtime, &ctx.config.database)
        .wait_ready(&policy)
        .await?;
    ctx.report.db_ready_attempts = attempts;
    println!("  ✓ PostgreSQL is ready after {} attempt(s)", attempts);
    ctx.advance(PipelineState::DbReady);
    Ok(())
}

async fn schema(ctx: &mut LaunchContext) -> Result<()> {
    Database::new(&ctx.runtime, &ctx.config.database)
        .apply_schema()
        .await?;
    println!("  ✓ tables products, sales_data ready");
    ctx.advance(PipelineState::SchemaReady);
    Ok(())
}

async fn load(ctx: &mut LaunchContext) -> Result<()> {
    let data = ctx.config.data.clone();
    // Both files are checked before anything is piped
    let expected_products = database::count_csv_rows(&data.products_csv).await?;
    let expected_sales = database::count_csv_rows(&data.sales_csv).await?;
    ctx.report.expected_products = Some(expected_products);
    ctx.report.expected_sales = Some(expected_sales);

    let db = Database::new(&ctx.runtime, &ctx.config.database);
    db.bulk_load(&PRODUCTS, &data.products_csv).await?;
    println!("  ✓ {} loaded", data.products_csv.display());
    db.bulk_load(&SALES, &data.sales_csv).await?;
    println!("  ✓ {} loaded", data.sales_csv.display());

    let products = db.row_count(&PRODUCTS).await?;
    let sales = db.row_count(&SALES).await?;

    let policy = ctx.config.row_counts;
    check_row_count(policy, &PRODUCTS, expected_products, products)?;
    check_row_count(policy, &SALES, expected_sales, sales)?;

    ctx.report.product_count = Some(products);
    ctx.report.sales_count = Some(sales);
    println!(
        "  ✓ {} products, {} sales rows in the database",
        products.to_string().green(),
        sales.to_string().green()
    );
    ctx.advance(PipelineState::DataLoaded);
    Ok(())
}

fn check_row_count(
    policy: RowCountPolicy,
    load: &TableLoad,
    expected: u64,
    actual: u64,
) -> Result<()> {
    if expected == actual {
        return Ok(());
    }
    match policy {
        RowCountPolicy::Strict => Err(LaunchError::RowCountMismatch {
            table: load.table.to_string(),
            expected,
            actual,
        }),
        RowCountPolicy::Warn => {
            tracing::warn!(
                "{}: expected {} rows, found {}",
                load.table,
                expected,
                actual
            );
            println!(
                "  {} {} has {} rows but the CSV has {}",
                "⚠".yellow(),
                load.table,
                actual,
                expected
            );
            Ok(())
        }
    }
}

async fn start_app(ctx: &mut LaunchContext) -> Result<()> {
    ctx.advance(PipelineState::AppStarting);
    if let Some(context) = &ctx.config.app.build_context {
        println!("  🔨 building {} from {}", ctx.config.app.image.cyan(), context.display());
        ctx.runtime.build_image(&ctx.config.app.image, context).await?;
        println!("  {} build finished", "✓".green());
    }

    let service = ctx.config.app_service();
    let id = ctx.runtime.run_service(&service).await?;
    ctx.running.record_service(&service.name);
    println!("  ✓ container {} started ({})", service.name.cyan(), short_id(&id));
    ctx.advance(PipelineState::AppReady);
    Ok(())
}

async fn fetch(ctx: &mut LaunchContext) -> Result<()> {
    let url = ctx.config.app_url();
    let policy = ctx.config.readiness.fetch;
    println!("  … polling {} (up to {} attempts)", url, policy.max_attempts);

    let client = http_client()?;
    let (body, attempts) = fetch_dashboard(&client, &url, &policy).await?;
    let path = write_artifact(&ctx.config.publish.dir, &body).await?;
    println!("  ✓ saved {} bytes to {}", body.len(), path.display());

    ctx.report.fetch_attempts = attempts;
    ctx.report.artifact_bytes = body.len();
    ctx.report.artifact = Some(path);
    ctx.advance(PipelineState::ContentFetched);
    Ok(())
}

async fn publish(ctx: &mut LaunchContext) -> Result<()> {
    let publish = &ctx.config.publish;
    let server = StaticServer::start(publish.dir.clone(), &publish.bind, publish.port).await?;
    println!("  ✓ serving {} on {}", publish.dir.display(), server.url().cyan());
    ctx.server = Some(server);
    ctx.advance(PipelineState::Published);
    Ok(())
}

/// A resource the runtime may have created while its stage was being cancelled
async fn adopt_unrecorded(ctx: &mut LaunchContext, stage: Stage) {
    let name = match stage {
        Stage::Network => {
            let network = ctx.config.network.clone();
            if ctx.running.network().is_none()
                && let Ok(true) = ctx.runtime.network_exists(&network).await
            {
                tracing::info!(
                    "network {} was created before the interrupt landed; tracking it",
                    network
                );
                ctx.running.record_network(network);
            }
            return;
        }
        Stage::Database => ctx.config.database.container.clone(),
        Stage::App => ctx.config.app.container.clone(),
        _ => return,
    };
    if ctx.running.services().contains(&name) {
        return;
    }
    if let Ok(true) = ctx.runtime.container_exists(&name).await {
        tracing::info!("{} started before the interrupt landed; tracking it", name);
        ctx.running.record_service(name);
    }
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn print_summary(ctx: &LaunchContext) {
    let report = &ctx.report;
    println!();
    println!("{}", "✓ Sales dashboard is up".green().bold());
    println!();
    println!("{}", "Endpoints:".bold());
    println!("  🌐 static copy  {}", ctx.config.publish_url().cyan());
    println!("  🌐 live app     {}", ctx.config.app_url().cyan());
    println!("  🐘 database     {}", ctx.config.database_url().cyan());
    println!();
    if let (Some(products), Some(sales)) = (report.product_count, report.sales_count) {
        println!("  • products: {}", products);
        println!("  • sales rows: {}", sales);
    }
    if let Some(artifact) = &report.artifact {
        println!("  • page: {} ({} bytes)", artifact.display(), report.artifact_bytes);
    }
    println!(
        "  • started at {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();
    println!("{}", "Press Ctrl+C to stop and clean up".dimmed());
}
