use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use std::process;

use morning_market_report::config::Config;
use morning_market_report::pipeline;

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting morning market report run");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    match pipeline::run(&config).await {
        Ok(path) => info!("Done: {}", path.display()),
        Err(e) => {
            error!("Report run failed: {}", e);
            process::exit(1);
        }
    }
}
