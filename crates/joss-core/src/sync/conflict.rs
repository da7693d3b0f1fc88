//! Conflict resolution for diverged push state.
//!
//! Invoked only on the push path, after the existing remote row is
//! fetched and found newer than the local snapshot. Resolution is
//! all-or-nothing at envelope granularity; pulling never runs a
//! symmetric check.

/// Timestamps presented to the resolver when push finds newer remote data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictContext {
    /// Remote row's last-modified (Unix ms)
    pub remote_last_modified: i64,
    /// Local snapshot's last-modified (Unix ms)
    pub local_last_modified: i64,
}

/// The binary choice offered when both sides diverged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    /// Proceed with the push, overwriting the newer remote state
    OverwriteRemote,
    /// Abandon the push and pull the remote state instead
    LoadRemote,
}

impl ConflictChoice {
    /// Stable name recorded in the conflict log
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OverwriteRemote => "overwrite-remote",
            Self::LoadRemote => "load-remote",
        }
    }
}

/// Decides what happens when the remote row is newer than the local push
pub trait ConflictResolver {
    fn resolve(&self, context: &ConflictContext) -> ConflictChoice;
}

/// Non-interactive policy: local state always wins
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOverwrite;

impl ConflictResolver for AlwaysOverwrite {
    fn resolve(&self, _context: &ConflictContext) -> ConflictChoice {
        ConflictChoice::OverwriteRemote
    }
}

/// Non-interactive policy: newer remote state always wins
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysLoadRemote;

impl ConflictResolver for AlwaysLoadRemote {
    fn resolve(&self, _context: &ConflictContext) -> ConflictChoice {
        ConflictChoice::LoadRemote
    }
}

impl<F> ConflictResolver for F
where
    F: Fn(&ConflictContext) -> ConflictChoice,
{
    fn resolve(&self, context: &ConflictContext) -> ConflictChoice {
        self(context)
    }
}
