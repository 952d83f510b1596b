use skirmish::prelude::*;

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    skirmish::init_tracing(&config.log_level);

    let server = SkirmishServerBuilder::from_config(&config).build().await?;
    tracing::info!(
        addr = %server.local_addr()?,
        max_players = config.room.max_players,
        starting_hp = config.room.starting_hp,
        policy = %config.room.disconnect_policy,
        "arena listening"
    );

    tokio::select! {
        result = server.run() => result?,
        _ = shutdown_signal() => tracing::info!("received Ctrl+C, shutting down"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
