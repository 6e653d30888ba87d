mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "salesdash")]
#[command(
    about = "Spin up PostgreSQL and the sales dashboard, then serve a static copy of the page",
    long_about = None
)]
struct Cli {
    /// Config file (defaults to SALESDASH_CONFIG, ./salesdash.yaml, then built-ins)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision everything and keep it running until Ctrl+C
    Up {
        /// Products CSV (product_id,product_name)
        #[arg(long)]
        products: Option<PathBuf>,
        /// Sales CSV (product_id,date,sales)
        #[arg(long)]
        sales: Option<PathBuf>,
        /// Fail when loaded row counts differ from the CSV line counts
        #[arg(long)]
        strict_counts: bool,
        /// Directory the fetched page is written to and served from
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Skip the host port availability check
        #[arg(long)]
        skip_preflight: bool,
    },
    /// Remove containers and the network left behind by a killed run
    Down,
    /// Print the effective configuration
    Config,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Status lines own stdout; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("salesdash {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (config, source) = salesdash_core::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Up {
            products,
            sales,
            strict_counts,
            output_dir,
            skip_preflight,
        } => {
            let overrides = commands::up::Overrides {
                products,
                sales,
                strict_counts,
                output_dir,
                skip_preflight,
            };
            commands::up::handle(config, source.as_deref(), overrides).await?;
        }
        Commands::Down => {
            commands::down::handle(&config).await?;
        }
        Commands::Config => {
            commands::config::handle(&config, source.as_deref())?;
        }
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
