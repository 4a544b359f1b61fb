use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::domain::error::DomainError;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Removes a stored image. Returns `false` when nothing was stored under
    /// `reference`.
    async fn release(&self, reference: &str) -> Result<bool, DomainError>;
}

/// Images kept as files below a root directory; references are paths relative to it.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            base_url,
        }
    }

    /// URL under which `reference` is served.
    pub fn public_url(&self, reference: &str) -> String {
        format!("{}/{}", self.base_url, reference.trim_start_matches('/'))
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, DomainError> {
        let relative = Path::new(reference);
        let inside_root = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if reference.is_empty() || !inside_root {
            return Err(DomainError::Validation {
                field: "image",
                message: "must be a relative path inside the image store",
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn release(&self, reference: &str) -> Result<bool, DomainError> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(DomainError::Unexpected(format!(
                "failed to remove image {}: {err}",
                path.display()
            ))),
        }
    }
}
