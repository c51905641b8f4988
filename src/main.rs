use std::env;

use anyhow::Context;
use phonorm::{run_pipeline, writer_for, PipelineConfig};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "PHONORM_CONFIG";
const DEFAULT_CONFIG: &str = "phonorm.yaml";

fn init_logging(config: &PipelineConfig) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if config.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<()> {
    let config_path = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let config = PipelineConfig::from_file(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;
    init_logging(&config);

    let dataset = run_pipeline(&config).context("running pipeline")?;
    let written = writer_for(config.output_format)
        .write(&dataset, &config.output_dir)
        .with_context(|| format!("writing dataset to {}", config.output_dir.display()))?;

    for path in written {
        tracing::info!(path = %path.display(), "dataset_file_written");
    }
    Ok(())
}
