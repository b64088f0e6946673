// # Instance Registry Trait
//
// Source of the device instances registered locally against controller
// addresses. Only `(id, displayName, address, gatewayId)` is needed.

use crate::model::RegisteredInstance;
use async_trait::async_trait;

/// Trait for registered-instance lookups
#[async_trait]
pub trait InstanceRegistry: Send + Sync {
    /// Instances bound to the given gateway, in discovery order
    async fn instances(&self, gateway_id: &str) -> Result<Vec<RegisteredInstance>, crate::Error>;
}
