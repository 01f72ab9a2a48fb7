use docgraph::infrastructure::{AppConfig, container::AppContainer};
use docgraph::presentation::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        "Starting docgraph on port {} with {} ingestion workers",
        config.server_port,
        config.ingest_workers
    );

    let container = AppContainer::new(&config).await?;
    HttpServer::new(&container, Some(config.server_port))
        .run()
        .await
}
