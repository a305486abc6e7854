use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Asset fetch or decode failure. Always carries the resolved path.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to decode model {path}: {reason}")]
    Model { path: PathBuf, reason: String },
    #[error("Asset not found: {path}")]
    NotFound { path: PathBuf },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Io { path, .. }
            | LoadError::Image { path, .. }
            | LoadError::Model { path, .. }
            | LoadError::NotFound { path } => path,
        }
    }
}

#[async_trait]
pub trait AssetLoader<A>: Send + Sync {
    async fn load(&self, path: &Path) -> Result<A, LoadError>;
}

/// Maps asset names onto `root/[subfolder/]name.ext`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetResolver {
    root: PathBuf,
    extension: String,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, name: &str, subfolder: Option<&str>) -> PathBuf {
        let mut path = self.root.clone();
        if let Some(dir) = subfolder.filter(|dir| !dir.is_empty()) {
            path.push(dir);
        }
        path.push(format!("{}.{}", name, self.extension));
        path
    }
}
