//! Analysis cache: LRU keyed by 32-byte code hash, holding shared,
//! immutable `ContractInfo` values.

use super::LruCache;
use crate::analysis::ContractInfo;
use bytes::Bytes;
use ethereum_types::H256;
use std::sync::Arc;

const CAPACITY: usize = 65536;

pub struct AnalysisCache {
    inner: LruCache<H256, Arc<ContractInfo>>,
    enabled: bool,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self {
            inner: LruCache::new(CAPACITY),
            enabled: true,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve a `ContractInfo` for `code`, identified by `code_hash`. A
    /// zero hash or a disabled cache always recomputes the analysis
    /// directly, per §4.6.
    pub fn resolve(&self, code_hash: H256, code: Bytes) -> Arc<ContractInfo> {
        if !self.enabled || code_hash.is_zero() {
            return Arc::new(ContractInfo::analyze(code));
        }
        self.inner
            .get_or_insert(code_hash, || Arc::new(ContractInfo::analyze(code)))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}
