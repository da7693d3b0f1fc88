//! joss-core - Core library for Joss
//!
//! This crate contains the shared models, local store, and sync engine
//! used by all Joss interfaces.

pub mod config;
pub mod error;
pub mod export;
pub mod handshake;
pub mod models;
pub mod store;
pub mod sync;
pub mod util;

pub use config::RemoteConfig;
pub use error::{Error, Result};
pub use store::LocalStore;
pub use sync::{SyncCoordinator, SyncEnvelope};
