//! Multi-device synchronization engine

pub mod conflict;
pub mod coordinator;
pub mod envelope;
pub mod transport;

pub use conflict::{
    AlwaysLoadRemote, AlwaysOverwrite, ConflictChoice, ConflictContext, ConflictResolver,
};
pub use coordinator::{SyncAction, SyncCoordinator, SyncReport, SyncStatus};
pub use envelope::{RemoteRecord, SyncEnvelope, ENVELOPE_VERSION};
pub use transport::{
    CloudTransport, LocalFallbackTransport, Provider, PushOutcome, SyncTransport, Transport,
};
