//! JSON configuration store backed by the filesystem

use crate::services::{ConfigStore, ServiceError};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Config store that keeps one JSON document per path
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    /// Document written when the file does not exist yet
    default: Value,
}

impl JsonConfigStore {
    pub fn new(default: Value) -> Self {
        Self { default }
    }

    async fn write_default(&self, path: &Path) -> Result<(), ServiceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| ServiceError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let content = serde_json::to_string_pretty(&self.default).map_err(|source| {
            ServiceError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;

        fs::write(path, content)
            .await
            .map_err(|source| ServiceError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn load_or_init(&self, path: &Path) -> Result<Value, ServiceError> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                debug!("Loaded config from {}", path.display());
                serde_json::from_str(&content).map_err(|source| ServiceError::Json {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.write_default(path).await?;
                info!("Default config created here {}", path.display());
                Ok(self.default.clone())
            }
            Err(source) => Err(ServiceError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
