//! The contract every inventory backend implements.

use crate::error::InventoryResult;
use crate::types::Topology;
use async_trait::async_trait;
use std::path::Path;

/// A dynamic inventory backend driven by a config file.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    /// Whether `path` is a config this source should consume.
    fn verify(&self, path: &Path) -> InventoryResult<bool>;

    /// Build a topology from the config at `path`.
    async fn load(&self, path: &Path) -> InventoryResult<Topology>;
}
