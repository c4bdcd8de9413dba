//! Role keeper bot entry point
//!
//! Run with:
//! ```bash
//! cargo run -p keeper-bot
//! ```
//!
//! Configuration is loaded from environment variables.

use keeper_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        interval_secs = config.sweep.interval_secs,
        "Configuration loaded"
    );

    if let Err(e) = keeper_bot::run(config).await {
        error!(error = %e, "Bot stopped with an error");
        std::process::exit(1);
    }
}
