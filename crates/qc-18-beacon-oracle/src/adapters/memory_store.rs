//! In-memory snapshot store
//!
//! Keeps the encoded snapshot bytes, so a restore goes through the same
//! decoding path as a durable store.

use crate::domain::OracleSnapshot;
use crate::error::{OracleError, OracleResult};
use crate::ports::outbound::OracleStateStore;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Default)]
pub struct InMemoryStateStore {
    encoded: RwLock<Option<Vec<u8>>>,
    saves: AtomicU64,
    fail_saves: AtomicBool,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail until reset
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Raw encoded snapshot, if any
    pub fn encoded(&self) -> Option<Vec<u8>> {
        self.encoded.read().clone()
    }
}

impl OracleStateStore for InMemoryStateStore {
    fn load(&self) -> OracleResult<Option<OracleSnapshot>> {
        self.encoded
            .read()
            .as_deref()
            .map(OracleSnapshot::from_bytes)
            .transpose()
    }

    fn save(&self, snapshot: &OracleSnapshot) -> OracleResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(OracleError::storage("in-memory store is failing saves"));
        }
        let bytes = snapshot.to_bytes()?;
        *self.encoded.write() = Some(bytes);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
