use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info};

use postboard_server::application::publish_service::{PublishService, TracingNotifier};
use postboard_server::data::repositories::postgres::post_repository::PostgresPostRepository;
use postboard_server::infrastructure::database::{create_pool, run_migrations};
use postboard_server::infrastructure::logging::init_logging;
use postboard_server::infrastructure::publisher::run_publisher;
use postboard_server::infrastructure::settings::Settings;
use postboard_server::presentation::AppState;
use postboard_server::server::run_http;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings.database).await?;
    run_migrations(&pool).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let publisher = if settings.publisher.enabled {
        let service = Arc::new(PublishService::new(
            PostgresPostRepository::new(pool.clone()),
            TracingNotifier,
            settings.publisher.batch_size,
        ));
        Some(tokio::spawn(run_publisher(
            service,
            settings.publisher.interval,
            wait_for_shutdown(shutdown_rx.clone()),
        )))
    } else {
        info!("publisher disabled");
        None
    };

    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let state = AppState::new(pool, &settings);
    run_http(&settings, state, wait_for_shutdown(shutdown_rx)).await?;

    if let Some(publisher) = publisher
        && let Err(err) = publisher.await
    {
        error!(error = %err, "publisher task failed");
    }
    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
