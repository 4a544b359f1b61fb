use std::process;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use postboard_server::application::publish_service::{PublishService, TracingNotifier};
use postboard_server::data::repositories::postgres::post_repository::PostgresPostRepository;
use postboard_server::data::repositories::postgres::user_repository::PostgresUserRepository;
use postboard_server::data::user_repository::UserRepository;
use postboard_server::domain::user::{Role, normalize_email};
use postboard_server::infrastructure::database::create_pool;
use postboard_server::infrastructure::logging::init_logging;
use postboard_server::infrastructure::settings::{
    DatabaseSettings, PublisherSettings, log_level_from_env,
};

#[derive(Debug, Parser)]
#[command(name = "postboard-cli", version, about = "Operator tasks for postboard-server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one publication sweep and print what it did.
    PublishScheduled {
        /// Sweep as of this RFC 3339 instant instead of now; must not be in the future.
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
        /// Overrides PUBLISH_BATCH_SIZE.
        #[arg(long)]
        batch_size: Option<u32>,
    },
    /// Promote or demote a user.
    SetRole {
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: Role,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_logging(&log_level_from_env())?;

    let pool = create_pool(&DatabaseSettings::from_env()?).await?;

    match cli.command {
        Command::PublishScheduled { at, batch_size } => {
            let batch_size = match batch_size {
                Some(size) => size,
                None => PublisherSettings::from_env()?.batch_size,
            };
            let now = sweep_instant(at, Utc::now())?;
            let service = PublishService::new(
                PostgresPostRepository::new(pool),
                TracingNotifier,
                batch_size,
            );

            let report = service.run_sweep(now).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::SetRole { email, role } => {
            let email = normalize_email(&email)?;
            let user = PostgresUserRepository::new(pool)
                .set_role(&email, role)
                .await?
                .ok_or_else(|| anyhow!("no user with email {email}"))?;
            info!(user_id = user.id, role = %user.role, "user role changed");
            println!("{} ({}) is now {}", user.name, user.email, user.role);
        }
    }

    Ok(())
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .with_context(|| format!("expected an RFC 3339 timestamp, got {raw:?}"))
}

/// A sweep may look back in time but never ahead of the clock.
fn sweep_instant(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match at {
        Some(at) if at > now => Err(anyhow!(
            "--at {} is in the future; posts must not be published before their schedule",
            at.to_rfc3339()
        )),
        Some(at) => Ok(at),
        None => Ok(now),
    }
}
