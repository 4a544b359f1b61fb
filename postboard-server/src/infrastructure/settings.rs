use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub jwt_secret: String,
    pub jwt_ttl_seconds: i64,
    pub http_addr: String,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub http_request_body_limit_bytes: usize,
    pub http_concurrency_limit: usize,
    pub http_request_timeout_secs: u64,
    pub image_root: PathBuf,
    /// Public URL prefix that serves files under `image_root`.
    pub image_base_url: String,
    pub publisher: PublisherSettings,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

/// Background publication sweep.
#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub enabled: bool,
    pub interval: Duration,
    pub batch_size: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let database = DatabaseSettings::from_env()?;
        let jwt_secret = get_required("JWT_SECRET").context("JWT_SECRET is required")?;
        let jwt_ttl_seconds = parse_positive_env::<i64>("JWT_TTL_SECONDS", 3600)?;

        if jwt_secret.chars().count() < 32 {
            return Err(anyhow!("JWT_SECRET must be at least 32 characters"));
        }

        let http_addr = std::env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let cors_origins = parse_cors_origins(
            std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:8000,http://127.0.0.1:8000".to_string()),
        );
        let http_request_body_limit_bytes =
            parse_positive_env::<usize>("HTTP_REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let http_concurrency_limit = parse_positive_env::<usize>("HTTP_CONCURRENCY_LIMIT", 256)?;
        let http_request_timeout_secs = parse_positive_env::<u64>("HTTP_REQUEST_TIMEOUT_SECS", 10)?;
        let image_root = std::env::var("IMAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("storage/public"));
        let image_base_url =
            std::env::var("IMAGE_BASE_URL").unwrap_or_else(|_| "/storage".to_string());

        Ok(Self {
            database,
            jwt_secret,
            jwt_ttl_seconds,
            http_addr,
            cors_origins,
            log_level: log_level_from_env(),
            http_request_body_limit_bytes,
            http_concurrency_limit,
            http_request_timeout_secs,
            image_root,
            image_base_url,
            publisher: PublisherSettings::from_env()?,
        })
    }
}

impl DatabaseSettings {
    pub fn from_env() -> Result<Self> {
        let url = get_required("DATABASE_URL").context("DATABASE_URL is required")?;
        let max_connections = parse_positive_env::<u32>("DATABASE_MAX_CONNECTIONS", 10)?;
        Ok(Self {
            url,
            max_connections,
        })
    }
}

impl PublisherSettings {
    pub fn from_env() -> Result<Self> {
        let enabled = match std::env::var("PUBLISHER_ENABLED") {
            Ok(raw) => parse_bool(&raw).context("Failed to parse PUBLISHER_ENABLED")?,
            Err(_) => true,
        };
        let interval_secs = parse_positive_env::<u64>("PUBLISH_INTERVAL_SECS", 60)?;
        let batch_size = parse_positive_env::<u32>("PUBLISH_BATCH_SIZE", 100)?;

        Ok(Self {
            enabled,
            interval: Duration::from_secs(interval_secs),
            batch_size,
        })
    }
}

pub fn log_level_from_env() -> String {
    std::env::var("LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string())
}

fn get_required(key: &str) -> Result<String> {
    let value = std::env::var(key)?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn parse_cors_origins(raw: String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expecting a boolean, got {other:?}")),
    }
}

fn parse_positive_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_positive(key, std::env::var(key).ok(), default)
}

fn parse_positive<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?,
        None => default,
    };

    if value <= T::default() {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{parse_bool, parse_cors_origins, parse_positive};

    #[test]
    fn cors_origins_are_trimmed_and_empty_entries_dropped() {
        let origins = parse_cors_origins(" http://a.test , ,http://b.test,".to_string());
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn positive_numbers_fall_back_to_default() {
        assert_eq!(parse_positive::<u64>("X", None, 60).expect("default"), 60);
        assert_eq!(
            parse_positive::<usize>("X", Some(" 25 ".to_string()), 100).expect("parsed"),
            25
        );
    }

    #[test]
    fn zero_and_garbage_are_rejected() {
        assert!(parse_positive::<u64>("X", Some("0".to_string()), 60).is_err());
        assert!(parse_positive::<i64>("X", Some("-5".to_string()), 60).is_err());
        assert!(parse_positive::<u32>("X", Some("ten".to_string()), 10).is_err());
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert!(parse_bool("TRUE").expect("true"));
        assert!(parse_bool("1").expect("1"));
        assert!(!parse_bool(" off ").expect("off"));
        assert!(parse_bool("maybe").is_err());
    }
}
