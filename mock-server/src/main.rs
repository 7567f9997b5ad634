use mock_server::ServerConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let defaults = ServerConfig::default();
    let config = ServerConfig {
        api_key: std::env::var("PLAYPATH_API_KEY").unwrap_or(defaults.api_key),
        embeddings_api_key: std::env::var("PLAYPATH_EMBEDDINGS_KEY").ok(),
        ..defaults
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, chat_limit = config.chat_limit, "mock PlayPath API listening");
    mock_server::run(listener, config).await
}
