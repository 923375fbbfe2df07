//! # RocksDB State Store
//!
//! Durable [`OracleStateStore`] keeping the encoded snapshot under a single
//! key in its own column family.
//!
//! ## Column Families
//!
//! - `oracle` - Engine snapshot

use qc_18_beacon_oracle::{OracleError, OracleResult, OracleSnapshot, OracleStateStore};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteOptions, DB};
use std::path::Path;

pub const CF_ORACLE: &str = "oracle";

const SNAPSHOT_KEY: &[u8] = b"snapshot";

pub struct RocksDbStateStore {
    db: DB,
    sync_writes: bool,
}

impl RocksDbStateStore {
    /// Open or create the database at `path`
    pub fn open(path: impl AsRef<Path>, sync_writes: bool) -> OracleResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut cf_opts = Options::default();
        cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
        let cf = ColumnFamilyDescriptor::new(CF_ORACLE, cf_opts);

        let db = DB::open_cf_descriptors(&opts, path.as_ref(), vec![cf])
            .map_err(|e| OracleError::storage(format!("Failed to open RocksDB: {}", e)))?;

        Ok(Self { db, sync_writes })
    }

    fn cf(&self) -> OracleResult<&ColumnFamily> {
        self.db
            .cf_handle(CF_ORACLE)
            .ok_or_else(|| OracleError::storage("missing oracle column family"))
    }
}

impl OracleStateStore for RocksDbStateStore {
    fn load(&self) -> OracleResult<Option<OracleSnapshot>> {
        let bytes = self
            .db
            .get_cf(self.cf()?, SNAPSHOT_KEY)
            .map_err(|e| OracleError::storage(format!("RocksDB get failed: {}", e)))?;
        bytes.as_deref().map(OracleSnapshot::from_bytes).transpose()
    }

    fn save(&self, snapshot: &OracleSnapshot) -> OracleResult<()> {
        let bytes = snapshot.to_bytes()?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);

        self.db
            .put_cf_opt(self.cf()?, SNAPSHOT_KEY, bytes, &write_opts)
            .map_err(|e| OracleError::storage(format!("RocksDB put failed: {}", e)))
    }
}
