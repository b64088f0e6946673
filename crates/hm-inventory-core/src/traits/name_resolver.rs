// # Device Name Resolver Trait
//
// Looks up the name a channel was given on the controller itself.

use async_trait::async_trait;

/// Trait for controller-side name lookups
#[async_trait]
pub trait DeviceNameResolver: Send + Sync {
    /// Name of the channel with the given address
    ///
    /// # Returns
    ///
    /// - `Ok(Some(name))`: The channel has a name
    /// - `Ok(None)`: The controller knows no name for it
    /// - `Err(Error)`: The lookup failed
    async fn channel_name(&self, address: &str) -> Result<Option<String>, crate::Error>;
}
