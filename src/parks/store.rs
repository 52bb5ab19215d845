//! Persistent park catalog
//!
//! The whole catalog is stored as one `postcard` value so that reads return
//! parks in exactly the order they were loaded.

use std::path::Path;

use async_trait::async_trait;
use fjall::{Database, Keyspace, PersistMode};
use tokio::task;
use tracing::{debug, info};

use super::ParkCatalog;
use crate::Result;
use crate::error::DataRunError;
use crate::models::Park;

const CATALOG_KEY: &[u8] = b"catalog";

/// Park catalog kept on disk between runs
#[derive(Clone)]
pub struct ParkStore {
    db: Database,
    store: Keyspace,
}

impl ParkStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = fjall::Database::builder(path).open().map_err(|e| {
            DataRunError::catalog(format!("Failed to open park store {}: {e}", path.display()))
        })?;
        let store = db
            .keyspace("parks", fjall::KeyspaceCreateOptions::default)
            .map_err(|e| DataRunError::catalog(format!("Failed to open parks keyspace: {e}")))?;
        Ok(Self { db, store })
    }

    /// Replace the stored catalog with `parks`
    pub async fn replace_all(&self, parks: &[Park]) -> Result<()> {
        let bytes = postcard::to_stdvec(parks)
            .map_err(|e| DataRunError::catalog(format!("Failed to encode parks: {e}")))?;
        let db = self.db.clone();
        let store = self.store.clone();

        task::spawn_blocking(move || {
            store.insert(CATALOG_KEY.to_vec(), bytes)?;
            db.persist(PersistMode::SyncAll)
        })
            .await
            .map_err(|e| DataRunError::catalog(e.to_string()))?
            .map_err(|e| DataRunError::catalog(format!("Failed to write parks: {e}")))?;

        info!("Stored {} parks", parks.len());
        Ok(())
    }

    /// Every stored park, empty when nothing has been loaded yet
    pub async fn load_all(&self) -> Result<Vec<Park>> {
        let store = self.store.clone();
        let bytes = task::spawn_blocking(move || store.get(CATALOG_KEY))
            .await
            .map_err(|e| DataRunError::catalog(e.to_string()))?
            .map_err(|e| DataRunError::catalog(format!("Failed to read parks: {e}")))?;

        let Some(bytes) = bytes else {
            debug!("Park store is empty");
            return Ok(Vec::new());
        };

        postcard::from_bytes(&bytes)
            .map_err(|e| DataRunError::catalog(format!("Stored parks are corrupt: {e}")))
    }
}

#[async_trait]
impl ParkCatalog for ParkStore {
    async fn parks(&self) -> Result<Vec<Park>> {
        self.load_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    fn sample_parks() -> Vec<Park> {
        vec![
            Park::new(
                "Parque del Retiro",
                Some("Plaza de la Independencia 7".to_string()),
                Coordinate::new(40.415_3, -3.684_4),
            ),
            Park::new("Casa de Campo", None, Coordinate::new(40.419_4, -3.747_8)),
        ]
    }

    #[tokio::test]
    async fn test_empty_store_has_no_parks() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParkStore::open(dir.path()).unwrap();
        assert!(store.parks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_all_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParkStore::open(dir.path()).unwrap();

        store.replace_all(&sample_parks()).await.unwrap();
        assert_eq!(store.parks().await.unwrap(), sample_parks());

        let single = vec![sample_parks().remove(1)];
        store.replace_all(&single).await.unwrap();
        assert_eq!(store.parks().await.unwrap(), single);
    }
}
