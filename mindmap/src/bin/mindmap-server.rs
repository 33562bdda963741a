//! Mind map HTTP server.
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! RUST_LOG=mindmap=debug cargo run -p mindmap --features server --bin mindmap-server
//! ```

use anyhow::Context;
use mindmap::{init_tracing, server, AppConfig, LogFormat, MindMapService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(LogFormat::from_env());

    let config = AppConfig::from_env().context("loading configuration")?;
    tracing::info!(
        bind = %config.bind,
        model = %config.provider.model,
        max_attempts = config.retry.max_attempts(),
        deadline_secs = config.retry.deadline().map(|d| d.as_secs()),
        "Configuration loaded"
    );

    let service = MindMapService::from_config(&config).context("building service")?;
    server::serve(service, config.bind)
        .await
        .context("serving HTTP")?;

    Ok(())
}
