//! Instance registry implementations
//!
//! - [`StaticInstanceRegistry`]: a fixed list handed in at construction
//! - [`FileInstanceRegistry`]: a JSON array of instances, re-read on every run
//!
//! Both return only the instances bound to the requested gateway and keep
//! the order in which the instances were listed.

use crate::error::{Error, Result};
use crate::model::RegisteredInstance;
use crate::traits::InstanceRegistry;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Registry over a fixed set of instances
#[derive(Debug, Clone, Default)]
pub struct StaticInstanceRegistry {
    instances: Vec<RegisteredInstance>,
}

impl StaticInstanceRegistry {
    pub fn new(instances: Vec<RegisteredInstance>) -> Self {
        Self { instances }
    }
}

#[async_trait]
impl InstanceRegistry for StaticInstanceRegistry {
    async fn instances(&self, gateway_id: &str) -> Result<Vec<RegisteredInstance>> {
        Ok(filter_gateway(self.instances.iter().cloned(), gateway_id))
    }
}

/// Registry backed by a JSON file
///
/// The file holds an array of `{ "id", "displayName", "address", "gatewayId" }`
/// objects. A missing file means no instances are registered.
#[derive(Debug, Clone)]
pub struct FileInstanceRegistry {
    path: PathBuf,
}

impl FileInstanceRegistry {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the instance file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl InstanceRegistry for FileInstanceRegistry {
    async fn instances(&self, gateway_id: &str) -> Result<Vec<RegisteredInstance>> {
        if !self.path.exists() {
            tracing::debug!("Instance file does not exist: {}", self.path.display());
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::registry(format!(
                "Failed to read instance file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let all: Vec<RegisteredInstance> = serde_json::from_str(&content).map_err(|e| {
            Error::registry(format!(
                "Failed to parse instance file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let total = all.len();
        let selected = filter_gateway(all.into_iter(), gateway_id);
        tracing::debug!(
            "Loaded {} of {} instance(s) for gateway {}",
            selected.len(),
            total,
            gateway_id
        );
        Ok(selected)
    }
}

fn filter_gateway(
    instances: impl Iterator<Item = RegisteredInstance>,
    gateway_id: &str,
) -> Vec<RegisteredInstance> {
    instances.filter(|i| i.gateway_id == gateway_id).collect()
}
