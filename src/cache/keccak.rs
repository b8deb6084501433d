//! Keccak cache: bucketed LRU caches for the two input sizes that dominate
//! EVM `SHA3` traffic (32-byte words and 64-byte mapping-slot encodings).
//! Any other input length bypasses the cache and hashes directly.

use super::LruCache;
use ethereum_types::H256;
use sha3::{Digest, Keccak256};

const BUCKET_CAPACITY: usize = 1024;

fn keccak256(bytes: &[u8]) -> H256 {
    H256::from_slice(&Keccak256::digest(bytes))
}

/// Caches `Keccak256` over exactly-32-byte and exactly-64-byte inputs.
pub struct KeccakCache {
    bucket32: LruCache<[u8; 32], H256>,
    bucket64: LruCache<[u8; 64], H256>,
    enabled: std::sync::atomic::AtomicBool,
}

impl Default for KeccakCache {
    fn default() -> Self {
        Self::new()
    }
}

impl KeccakCache {
    pub fn new() -> Self {
        Self {
            bucket32: LruCache::new(BUCKET_CAPACITY),
            bucket64: LruCache::new(BUCKET_CAPACITY),
            enabled: std::sync::atomic::AtomicBool::new(true),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Hash `bytes`, consulting the appropriately-sized bucket if one
    /// exists for this length.
    pub fn hash(&self, bytes: &[u8]) -> H256 {
        if !self.enabled() {
            return keccak256(bytes);
        }
        match bytes.len() {
            32 => {
                let mut key = [0u8; 32];
                key.copy_from_slice(bytes);
                self.bucket32.get_or_insert(key, || keccak256(bytes))
            }
            64 => {
                let mut key = [0u8; 64];
                key.copy_from_slice(bytes);
                self.bucket64.get_or_insert(key, || keccak256(bytes))
            }
            _ => keccak256(bytes),
        }
    }
}
