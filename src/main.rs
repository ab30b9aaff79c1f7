use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use piechess_server::config::Config;
use piechess_server::engine::EnginePool;
use piechess_server::server::{self, AppState};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();
    config.validate()?;

    // No engine, no server.
    let pool = EnginePool::spawn_uci(&config.engine_options(), config.engines)
        .with_context(|| format!("failed to start analysis engine {}", config.engine.display()))?;
    info!("{} engine(s) '{}' started from {}", pool.size(), pool.name(), config.engine.display());
    let state = Arc::new(AppState::new(pool, config.time_limits()));

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    rt.block_on(server::serve(&config.host, config.port, state))
        .with_context(|| format!("server on {}:{} failed", config.host, config.port))?;
    info!("bye");
    Ok(())
}
