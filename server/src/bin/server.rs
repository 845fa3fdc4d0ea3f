use std::sync::Arc;

use parley_core::{GatewayConfig, LlmClient, ResponseFacade, ToolRegistry};
use parley_server::{router, serve, AppState};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,parley_core=info,parley_server=info"));
    fmt().with_env_filter(env_filter).compact().init();

    let cfg = GatewayConfig::load()?;
    let client = LlmClient::new(cfg.llm.clone())?;
    let registry = ToolRegistry::with_builtin_tools();
    tracing::info!(
        model = %cfg.llm.model,
        base_url = %cfg.llm.base_url,
        tools = registry.len(),
        "Provider configured"
    );
    if cfg.llm.api_key.is_none() {
        tracing::warn!("No API key set (LLM_API_KEY / OPENAI_API_KEY); requests may be rejected");
    }

    let facade = ResponseFacade::new(Arc::new(client), registry, &cfg);
    let app = router(AppState::new(facade));

    serve(&cfg.server.bind_addr, app).await?;
    Ok(())
}
