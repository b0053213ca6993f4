use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use tokio::net::TcpListener;

use pawmart_api::{
    app,
    config::{self, Config},
    server,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before logging starts, so RUST_LOG and LOG_FORMAT may come from the file.
    let env_file = config::load_env_file(Path::new(".env"));
    pawmart_observability::init();

    if let Some(path) = env_file.context("environment misconfigured")? {
        tracing::info!(path = %path.display(), "loaded environment file");
    }

    let config = Config::from_env().context("environment misconfigured")?;
    let state = AppState::from_config(&config).await?;
    let app = app::build_app(state);

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    server::serve(listener, app).await?;

    tracing::info!("server shut down");
    Ok(())
}
