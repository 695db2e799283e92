use anyhow::Context;
use clap::Parser;
use geoedit::cli::{self, Cli};
use geoedit::{init_logging, Config, GeometryOperations, HttpGeometryService, LogFeedback};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging()?;

    let cli = Cli::parse();

    let config_path = Config::default_path()?;
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config.validate()?;
    tracing::debug!(
        "GeoEdit {} (built {}), service at {}",
        geoedit::VERSION,
        geoedit::BUILD_DATE,
        config.service.base_url
    );

    let geometry = cli::read_geometry(cli.operation.input())?;
    let service = HttpGeometryService::new(config.service.clone())?;
    let operations = GeometryOperations::new(Arc::new(service), Arc::new(LogFeedback));

    let output = cli::run(&cli.operation, &geometry, &operations, &config.operations).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
