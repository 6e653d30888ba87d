use colored::Colorize;
use salesdash::{LaunchContext, Shutdown, launch};
use salesdash_container::SystemRunner;
use salesdash_core::{LaunchConfig, RowCountPolicy};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command-line overrides applied on top of the loaded config
#[derive(Debug, Default)]
pub struct Overrides {
    pub products: Option<PathBuf>,
    pub sales: Option<PathBuf>,
    pub strict_counts: bool,
    pub output_dir: Option<PathBuf>,
    pub skip_preflight: bool,
}

impl Overrides {
    fn apply(self, config: &mut LaunchConfig) {
        if let Some(products) = self.products {
            config.data.products_csv = products;
        }
        if let Some(sales) = self.sales {
            config.data.sales_csv = sales;
        }
        if self.strict_counts {
            config.row_counts = RowCountPolicy::Strict;
        }
        if let Some(dir) = self.output_dir {
            config.publish.dir = dir;
        }
        if self.skip_preflight {
            config.preflight_ports = false;
        }
    }
}

pub async fn handle(
    mut config: LaunchConfig,
    source: Option<&Path>,
    overrides: Overrides,
) -> anyhow::Result<()> {
    overrides.apply(&mut config);
    config.validate()?;

    println!("{}", "Starting the sales dashboard stack...".yellow());
    match source {
        Some(path) => println!("Config: {}", path.display().to_string().cyan()),
        None => println!("Config: {}", "built-in defaults".dimmed()),
    }
    println!("Runtime: {}", config.runtime.cyan());

    let shutdown = Shutdown::on_signals();
    let mut ctx = LaunchContext::new(config, Arc::new(SystemRunner));

    match launch(&mut ctx, &shutdown).await {
        Ok(report) => {
            tracing::debug!("teardown: {:?}", report);
            println!();
            println!("{}", "✓ Stopped cleanly".green().bold());
            Ok(())
        }
        Err(failure) if failure.is_interrupted() => {
            println!();
            println!(
                "{}",
                format!("ℹ Interrupted during the {} stage, cleaned up", failure.stage).yellow()
            );
            Ok(())
        }
        Err(failure) => {
            eprintln!();
            eprintln!(
                "{}",
                format!(
                    "✗ Stage {}/7 ({}) failed",
                    failure.stage.ordinal(),
                    failure.stage
                )
                .red()
                .bold()
            );
            eprintln!();
            eprintln!("{}", "Cause:".yellow());
            eprintln!("  {}", failure.source);
            if failure.is_readiness_timeout() {
                eprintln!();
                eprintln!("{}", "Hint:".yellow());
                eprintln!("  • Raise readiness attempts in the config file");
                eprintln!("  • Check the container logs with `docker logs`");
            }
            if failure.is_partial() {
                eprintln!();
                eprintln!(
                    "{}",
                    format!("Released: {}", failure.started.join(", ")).dimmed()
                );
            }
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = LaunchConfig::default();
        Overrides {
            products: Some(PathBuf::from("p.csv")),
            sales: None,
            strict_counts: true,
            output_dir: Some(PathBuf::from("out")),
            skip_preflight: true,
        }
        .apply(&mut config);

        assert_eq!(config.data.products_csv, PathBuf::from("p.csv"));
        assert_eq!(config.data.sales_csv, PathBuf::from("data/sales_data.csv"));
        assert_eq!(config.row_counts, RowCountPolicy::Strict);
        assert_eq!(config.publish.dir, PathBuf::from("out"));
        assert!(!config.preflight_ports);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = LaunchConfig::default();
        Overrides::default().apply(&mut config);
        assert_eq!(config, LaunchConfig::default());
    }
}
