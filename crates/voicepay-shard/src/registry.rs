//! Maps user addresses to their in-process [`Shard`] handle (spec §4.1
//! addressing: "requests for the same user always reach the same shard").

use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use voicepay_types::UserAddress;

use crate::error::ShardError;
use crate::shard::Shard;

pub struct ShardRegistry {
    base_dir: PathBuf,
    shards: DashMap<UserAddress, Arc<Shard>>,
}

impl ShardRegistry {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            shards: DashMap::new(),
        }
    }

    /// Return the shard for `address`, opening its SQLite file the first
    /// time it's addressed.
    pub fn get_or_open(&self, address: UserAddress) -> Result<Arc<Shard>, ShardError> {
        if let Some(shard) = self.shards.get(&address) {
            return Ok(Arc::clone(&shard));
        }

        let shard = Arc::new(Shard::open(&self.base_dir, address.clone())?);
        // Another thread may have raced us to open the same shard; defer to
        // whichever handle landed first so callers never hold two `Shard`s
        // backed by the same file.
        let shard = self
            .shards
            .entry(address)
            .or_insert_with(|| shard)
            .clone();
        Ok(shard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_address_returns_the_same_shard_instance() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ShardRegistry::new(dir.path());
        let address: UserAddress = "0x1111111111111111111111111111111111111111".parse().unwrap();

        let a = registry.get_or_open(address.clone()).unwrap();
        let b = registry.get_or_open(address).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_addresses_get_different_shards() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ShardRegistry::new(dir.path());
        let a = registry
            .get_or_open("0x1111111111111111111111111111111111111111".parse().unwrap())
            .unwrap();
        let b = registry
            .get_or_open("0x2222222222222222222222222222222222222222".parse().unwrap())
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
