use anyhow::{Context, Result};
use todo_server::lifecycle::{self, Server};
use todo_server::{app, telemetry, AppState, Config, MongoStore};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let config = Config::from_env().context("failed to read config")?;

    let store = MongoStore::connect(&config.database)
        .await
        .with_context(|| format!("failed to connect to {}", config.database.uri))?;

    let state = AppState::new(store).with_request_timeout(config.request_timeout);
    let server = Server::bind(config.listen_addr, app(state), config.shutdown_grace)
        .await
        .context("failed to start listener")?
        .with_read_timeout(config.read_timeout);

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        lifecycle::interrupt().await;
        info!("interrupt received");
        trigger.cancel();
    });

    let outcome = server.run(shutdown).await.context("server error")?;
    info!(?outcome, "stopped");
    Ok(())
}
