#![cfg(not(tarpaulin_include))]

use sunburst::app;
use sunburst::config::Config;

/// Main entry point for the web application
///
/// Reads the configuration from the environment (and `.env`), sets up logging at the level
/// the `DEBUG` flag selects, and serves the upload page and chart API.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level()))
        .init();
    log::debug!("configuration: {:?}", config);

    app::run(config).await
}
