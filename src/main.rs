//! An in-memory item store served over a JSON REST API.

use item_store::{
    app::run_app,
    feature::item::item_repository::ItemStore,
    infra::{config::load_config, logging::init_logging, state::AppState},
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = load_config()?;
    let _guard = init_logging(&config.log);

    let listener = TcpListener::bind(config.server.socket_address()).await?;
    let port = listener.local_addr()?.port();
    tracing::info!(
        environment = %config.environment,
        "Item store started. Server: http://localhost:{port}, health: http://localhost:{port}/health, readiness: http://localhost:{port}/ready"
    );

    let state = AppState::new(config, ItemStore::seeded());
    run_app(listener, state).await?;

    Ok(())
}
