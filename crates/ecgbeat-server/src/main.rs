use anyhow::{Context, Result};
use clap::Parser;
use ecgbeat_lib::{
    trace::{FileTrace, NoTrace, TraceSink},
    NativeAnalyzer,
};
use ecgbeat_server::{router, AppState, ServerArgs, ServerConfig};
use env_logger::Env;
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = ServerConfig::resolve(ServerArgs::parse())?;
    env_logger::Builder::from_env(Env::default().default_filter_or(&cfg.log_level)).init();

    let trace: Arc<dyn TraceSink> = match &cfg.trace_dir {
        Some(dir) => {
            info!("Writing trace dumps to {}", dir.display());
            Arc::new(FileTrace::new(dir))
        }
        None => Arc::new(NoTrace),
    };
    let state = AppState::new(Arc::new(NativeAnalyzer::default()), trace, &cfg.sample_file);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((cfg.host.as_str(), cfg.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", cfg.host, cfg.port))?;
    let addr = listener
        .local_addr()
        .context("failed to read local listener address")?;
    info!(
        "Starting ecgbeat-server on {} (sample file {})",
        addr,
        cfg.sample_file.display()
    );
    axum::serve(listener, app).await.context("axum server error")?;
    Ok(())
}
