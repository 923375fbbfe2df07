//! # Beacon Oracle Test Suite
//!
//! Cross-crate tests: the consensus service wired to the runtime's RocksDB
//! store, accounting channel and command handler.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # criterion benchmarks of the consensus engine
//! └── src/integration/
//!     ├── lifecycle.rs  # restart/resume across frames
//!     ├── churn.rs      # membership and spec changes mid-frame
//!     ├── downstream.rs # accounting failures
//!     └── commands.rs   # line-delimited JSON surface end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p oracle-tests
//! cargo test -p oracle-tests integration::churn::
//!
//! # Benchmarks
//! cargo bench -p oracle-tests
//! ```

#![allow(dead_code)]

pub mod integration;
