use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::application::publish_service::{PublicationNotifier, PublishService};
use crate::data::post_repository::PostRepository;

/// Runs a publication sweep every `interval` until `shutdown` resolves.
///
/// The first sweep runs immediately. Ticks missed during a slow sweep are
/// skipped, so this loop never has two sweeps in flight; the CLI or another
/// replica may still sweep concurrently.
pub async fn run_publisher<R, N, F>(
    service: Arc<PublishService<R, N>>,
    interval: Duration,
    shutdown: F,
) where
    R: PostRepository,
    N: PublicationNotifier,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!(interval_secs = interval.as_secs_f64(), "publisher started");
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                if let Err(err) = service.run_sweep(Utc::now()).await {
                    error!(error = %err, "publish sweep failed");
                }
            }
        }
    }
    info!("publisher stopped");
}
