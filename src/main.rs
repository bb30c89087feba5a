use std::sync::Arc;

use httprom::config::{load_config, print_schema};
use httprom::startup;
use httprom::utils::logger::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::args().skip(1).any(|arg| arg == "--schema") {
        print_schema()?;
        return Ok(());
    }

    let config = Arc::new(load_config());
    init_logging(&config.logging);

    startup::run(config).await
}
