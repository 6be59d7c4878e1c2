pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

use eyre::Result;
use log::{info, warn};

use crate::utils::config::Config;
use router::build_routes;
use state::AppState;

pub async fn listen(config: Config) -> Result<()> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config)?;

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("listening at {}", address);
    if !state.agent.is_available() {
        warn!("serving without an LLM, AI routes will report unavailable");
    }

    tokio::select! {
        r = axum::serve(listener, build_routes(state)) => {
            warn!("server ended unexpectedly: {:?}", r)
        },
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl+c interrupt, closing server");
        }
    }
    Ok(())
}
