use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::post::Post;

/// Emitted once for every post a sweep actually published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedPost {
    pub post_id: i64,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

#[async_trait]
pub trait PublicationNotifier: Send + Sync {
    async fn post_published(&self, event: &PublishedPost);
}

/// Default sink: one structured log event per publication.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl PublicationNotifier for TracingNotifier {
    async fn post_published(&self, event: &PublishedPost) {
        info!(
            post_id = event.post_id,
            title = %event.title,
            published_at = %event.published_at,
            "published scheduled post"
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub published: Vec<i64>,
    /// Due posts another sweep published between our read and our write.
    pub skipped: usize,
    /// Posts whose write failed; they stay due for the next sweep.
    pub failed: Vec<i64>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.published.is_empty() && self.skipped == 0 && self.failed.is_empty()
    }
}

pub struct PublishService<R: PostRepository, N: PublicationNotifier> {
    repo: R,
    notifier: N,
    batch_size: u32,
}

impl<R: PostRepository, N: PublicationNotifier> PublishService<R, N> {
    pub const DEFAULT_BATCH_SIZE: u32 = 100;

    pub fn new(repo: R, notifier: N, batch_size: u32) -> Self {
        Self {
            repo,
            notifier,
            batch_size: batch_size.max(1),
        }
    }

    /// Publishes every post whose `scheduled_at` is at or before `now`.
    ///
    /// Posts are handled one by one; a failed write is logged and left for
    /// the next sweep without stopping the rest of the batch. Only a failed
    /// candidate lookup aborts the sweep.
    pub async fn run_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, DomainError> {
        let mut report = SweepReport::default();
        let mut after_id = 0;

        loop {
            let batch = self
                .repo
                .find_due_posts(now, after_id, self.batch_size)
                .await?;
            let fetched = batch.len();

            for post in batch {
                after_id = after_id.max(post.id);
                self.publish_one(post, now, &mut report).await;
            }

            if fetched < self.batch_size as usize {
                break;
            }
        }

        if report.is_empty() {
            debug!(%now, "publish sweep found no due posts");
        } else {
            info!(
                %now,
                published = report.published.len(),
                skipped = report.skipped,
                failed = report.failed.len(),
                "publish sweep finished"
            );
        }
        Ok(report)
    }

    async fn publish_one(&self, post: Post, now: DateTime<Utc>, report: &mut SweepReport) {
        match self.repo.try_set_published(post.id, now).await {
            Ok(true) => {
                report.published.push(post.id);
                let event = PublishedPost {
                    post_id: post.id,
                    title: post.title,
                    published_at: now,
                };
                self.notifier.post_published(&event).await;
            }
            Ok(false) => {
                report.skipped += 1;
                debug!(post_id = post.id, "post already published elsewhere");
            }
            Err(err) => {
                report.failed.push(post.id);
                warn!(
                    post_id = post.id,
                    error = %err,
                    "failed to publish scheduled post, will retry on next sweep"
                );
            }
        }
    }
}
