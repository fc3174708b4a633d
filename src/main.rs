use std::sync::Arc;

use anyhow::Context;

use log::{error, info};

use scripting_thoughts::{accounts::InMemoryAccounts, config, handlers, server::Server, site::Site};

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

async fn try_main() -> anyhow::Result<()> {
    let config_file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./config/config.json".to_string());

    let configuration = config::read_configuration(config_file)
        .await
        .context("read_configuration error")?;

    let site_configuration = configuration.site_configuration();

    let accounts = InMemoryAccounts::from_configuration(site_configuration);

    let site = Arc::new(Site::new(site_configuration, Arc::new(accounts)));

    let router = handlers::create_router(site).context("create_router error")?;

    let server = Server::new(router, configuration.server_configuration());

    server.run().await
}

#[tokio::main]
async fn main() {
    init_logger();

    info!("begin main");

    if let Err(err) = try_main().await {
        error!("fatal error in main:\n{:#}", err);
        std::process::exit(1);
    }
}
