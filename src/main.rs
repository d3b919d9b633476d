use std::time::Duration;

use tracing::error;

use infocenter::broker::engine;
use infocenter::config::load_config;
use infocenter::transport::http::{AppState, start_http_server};
use infocenter::utils::error::Error;
use infocenter::utils::logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init("info");

    if let Err(e) = run().await {
        error!("server failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config = load_config()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let broker = engine::spawn(config.broker.queue_capacity);
    let state = AppState {
        broker,
        heartbeat: Duration::from_secs(config.broker.heartbeat_secs),
    };

    start_http_server(&addr, state).await
}
