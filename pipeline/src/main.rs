use clap::Parser;
use pipeline::config::{PartitionKey, PipelineConfig};
use pipeline::job;

#[derive(Parser)]
#[command(
    name = "pipeline",
    about = "Wide month supplier metrics: monthly part metrics with rolling windows, written as CSV shards"
)]
struct Cli {
    /// Partition key (e.g. a timestamp) used as the output folder name
    partition_key: String,

    /// Bind the source and print the optimized query plan without writing output
    #[arg(long, action = clap::ArgAction::SetTrue)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init structured logging (respects RUST_LOG; defaults to info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let key = PartitionKey::parse(&cli.partition_key)?;
    let config = PipelineConfig::from_env()?;

    tracing::info!(
        source = %config.source_path.display(),
        output_root = %config.output_root.display(),
        partition = %key,
        shards = config.output_shards,
        "Starting pipeline"
    );

    if cli.dry_run {
        let plan = job::explain(&config).await?;
        println!("{plan}");
        return Ok(());
    }

    job::run(&config, &key).await?;
    Ok(())
}
