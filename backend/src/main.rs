use std::sync::Arc;

use estatenest_backend::config::AppConfig;
use estatenest_backend::db::{self, DocumentStore, OfflineStore};
use estatenest_backend::handlers::{self, AppState};
use estatenest_backend::payment::StripeGateway;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for SIGINT: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received SIGINT"),
        _ = terminate => log::info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!("Loaded config: {:?}", config);

    let store: Arc<dyn DocumentStore> = match config.database_uri() {
        Ok(uri) => db::open_store(&uri, &config.db_name).await,
        Err(e) => {
            log::error!("No database configured: {}", e);
            Arc::new(OfflineStore::new(e.to_string()))
        }
    };
    match store.ping().await {
        Ok(()) => log::info!("Pinged your deployment. You successfully connected to MongoDB!"),
        // Keep serving; requests fail with 500 until the cluster is reachable.
        Err(e) => log::error!("Database ping failed: {}", e),
    }

    let payments = Arc::new(StripeGateway::new(&config.stripe_api_base, &config.stripe_secret_key));
    let app = handlers::router(AppState::new(store.clone(), payments));

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    log::info!("Real Estate server is running on port: {}", config.port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    log::info!("MongoClient disconnected on app termination");
    Ok(())
}
