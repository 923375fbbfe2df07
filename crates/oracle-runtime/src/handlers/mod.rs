//! # Command Handlers
//!
//! Operator surface of the runtime: JSON commands in, JSON responses out.

pub mod command;

pub use command::{CommandError, CommandHandler, CommandResponse, OracleCommand, StatusView};
