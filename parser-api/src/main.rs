use clap::Parser;
use parser_api::{Application, Config, config::Args, shutdown_signal, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The download client is built with reqwest's `rustls-no-provider`
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let args = Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    tracing::debug!(config_file = %args.config, "Loaded configuration");

    Application::new(config).await?.serve(shutdown_signal()).await
}
