//! Park catalog
//!
//! This module provides the park catalog consumed by the ranking pipeline:
//! - The `ParkCatalog` lookup trait
//! - A persistent store backed by `fjall`
//! - Ingestion of the Madrid city council's parks and gardens dataset

pub mod madrid;
pub mod store;

use async_trait::async_trait;

use crate::Result;
use crate::models::Park;

pub use madrid::{MadridParksSource, ingest};
pub use store::ParkStore;

/// Read access to the parks that can be recommended
#[async_trait]
pub trait ParkCatalog: Send + Sync {
    /// Every park, in a stable order
    async fn parks(&self) -> Result<Vec<Park>>;
}

#[async_trait]
impl ParkCatalog for Vec<Park> {
    async fn parks(&self) -> Result<Vec<Park>> {
        Ok(self.clone())
    }
}
