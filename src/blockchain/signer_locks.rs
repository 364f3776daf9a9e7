// src/blockchain/signer_locks.rs

use dashmap::DashMap;
use ethers_core::types::Address;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serialises write flows per signer address.
///
/// The allowance check in a swap is followed by a conditional `approve`, and
/// both read the pending nonce from the node. Two concurrent swaps from the
/// same signer would race on both, so each signer gets its own async mutex.
/// Different signers never contend. Nothing about chain state is stored here,
/// and a signer's entry is dropped once nobody holds or waits on it.
#[derive(Debug, Clone, Default)]
pub struct SignerLocks {
    locks: Arc<DashMap<Address, Arc<Mutex<()>>>>,
}

impl SignerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive use of `address`. The returned guard releases the
    /// signer when dropped.
    pub async fn acquire(&self, address: Address) -> SignerGuard {
        let lock = self
            .locks
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        SignerGuard {
            guard: Some(lock.lock_owned().await),
            address,
            locks: self.locks.clone(),
        }
    }
}

/// Exclusive use of one signer.
#[derive(Debug)]
pub struct SignerGuard {
    guard: Option<OwnedMutexGuard<()>>,
    address: Address,
    locks: Arc<DashMap<Address, Arc<Mutex<()>>>>,
}

impl Drop for SignerGuard {
    fn drop(&mut self) {
        // Release first so the map's Arc is the only one left when idle.
        // Waiters hold their own clone, which keeps the entry alive.
        self.guard.take();
        self.locks
            .remove_if(&self.address, |_, lock| Arc::strong_count(lock) == 1);
    }
}
