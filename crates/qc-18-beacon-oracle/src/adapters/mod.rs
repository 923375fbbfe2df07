//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports. Durable storage and
//! real accounting integrations live in the runtime crate.

mod memory_store;
mod receiver;
mod time;

pub use memory_store::InMemoryStateStore;
pub use receiver::RecordingReceiver;
pub use time::SystemTimeSource;
