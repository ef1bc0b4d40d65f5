use marlin::{MarlinSystem, load_config};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(config_error) => {
            error!(%config_error, "CRITICAL: configuration failure");
            std::process::exit(1);
        }
    };

    let system = match MarlinSystem::build(config) {
        Ok(system) => system,
        Err(build_error) => {
            error!(%build_error, "CRITICAL: system start-up failure");
            std::process::exit(1);
        }
    };

    system.run_until_shutdown().await;
}
