//! # Beacon Oracle Runtime
//!
//! Process host for the qc-18 beacon oracle.
//!
//! ## Modular Structure
//!
//! - `config` - TOML file plus `ORACLE_*` environment overrides
//! - `telemetry` - tracing subscriber setup
//! - `adapters/` - RocksDB state store and accounting channel
//! - `handlers/` - line-delimited JSON command surface
//! - `container` - wiring of the service to its adapters
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from file/env)
//! 2. Install logging
//! 3. Open storage, resume or seed oracle state
//! 4. Start the accounting consumer and event logger
//! 5. Serve commands on stdin until EOF or Ctrl+C

pub mod adapters;
pub mod config;
pub mod container;
pub mod handlers;
pub mod telemetry;

pub use config::{ConfigError, OracleNodeConfig};
pub use container::{OracleRuntime, RuntimeService};
