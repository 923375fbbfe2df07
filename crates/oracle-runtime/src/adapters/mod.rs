//! Port implementations backed by process resources

pub mod accounting;
pub mod rocksdb_store;

pub use accounting::{AccountingChannelReceiver, AccountingNotice};
pub use rocksdb_store::RocksDbStateStore;
