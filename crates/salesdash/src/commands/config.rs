use colored::Colorize;
use salesdash_core::LaunchConfig;
use std::path::Path;

pub fn handle(config: &LaunchConfig, source: Option<&Path>) -> anyhow::Result<()> {
    match source {
        Some(path) => println!("# {}", path.display().to_string().cyan()),
        None => println!("# {}", "built-in defaults".dimmed()),
    }
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
