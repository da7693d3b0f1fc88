//! Sync orchestration: outbound and inbound flows with a single
//! in-flight guard, conflict interception on push, and the automatic
//! push on reconnect.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};
use crate::models::ConflictEntry;
use crate::store::LocalStore;
use crate::util::unix_timestamp_ms;

use super::conflict::{ConflictChoice, ConflictContext, ConflictResolver};
use super::envelope::RemoteRecord;
use super::transport::{Provider, PushOutcome, SyncTransport};

/// What a completed sync did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Push created the device's remote row
    Created,
    /// Push updated the existing remote row
    Updated,
    /// Pull replaced local state with the remote envelope
    Loaded,
}

impl From<PushOutcome> for SyncAction {
    fn from(outcome: PushOutcome) -> Self {
        match outcome {
            PushOutcome::Created => Self::Created,
            PushOutcome::Updated => Self::Updated,
        }
    }
}

/// Outcome summary returned by the sync entry points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub provider: Provider,
    pub action: SyncAction,
    /// Device whose row was pushed or pulled
    pub device_id: String,
    /// When the sync completed (Unix ms)
    pub synced_at: i64,
    pub record_count: usize,
    pub believer_count: usize,
}

/// Snapshot of the coordinator's state for status display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub online: bool,
    pub in_progress: bool,
    pub device_id: String,
    pub provider: Provider,
    /// Last successful sync, if any (Unix ms)
    pub last_sync: Option<i64>,
}

/// Orchestrates sync between the local store and one transport.
///
/// Explicitly constructed and injected; at most one sync operation is in
/// flight per instance.
pub struct SyncCoordinator<T, R> {
    store: LocalStore,
    transport: T,
    resolver: R,
    online: AtomicBool,
    in_flight: AtomicBool,
}

/// Releases the in-flight flag when the sync call returns
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<T: SyncTransport, R: ConflictResolver> SyncCoordinator<T, R> {
    pub fn new(store: LocalStore, transport: T, resolver: R) -> Self {
        Self {
            store,
            transport,
            resolver,
            online: AtomicBool::new(true),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Mark the device online; on an offline-to-online transition attempt
    /// an automatic push. Returns whether a push ran and succeeded.
    pub async fn notify_online(&self) -> bool {
        let was_online = self.online.swap(true, Ordering::SeqCst);
        if was_online {
            return false;
        }
        self.auto_sync().await
    }

    pub fn notify_offline(&self) {
        self.set_online(false);
    }

    fn begin_sync(&self) -> Result<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::SyncInProgress)?;
        Ok(InFlightGuard(&self.in_flight))
    }

    /// Push local state to the backend.
    ///
    /// Fails fast when offline or when a sync is already in flight. When
    /// the existing remote row is newer, the conflict resolver decides
    /// between overwriting it and loading it instead; either way the
    /// resolution lands in the conflict log before any remote mutation.
    pub async fn sync_to_cloud(&self) -> Result<SyncReport> {
        if !self.is_online() {
            return Err(Error::Offline);
        }
        let _guard = self.begin_sync()?;
        self.push_inner().await
    }

    /// Pull the given device's envelope (own device when `None`), back up
    /// current local state, and overwrite every collection.
    ///
    /// Pull never checks whether local state is newer; the safeguard is
    /// one-directional by design of the observed system.
    pub async fn sync_from_cloud(&self, device_id: Option<&str>) -> Result<SyncReport> {
        if !self.is_online() {
            return Err(Error::Offline);
        }
        let _guard = self.begin_sync()?;
        self.pull_inner(device_id).await
    }

    async fn push_inner(&self) -> Result<SyncReport> {
        let envelope = self.store.snapshot().await?;

        let existing = match self.transport.pull(&envelope.device_id).await {
            Ok(row) => Some(row),
            Err(Error::NotFound(_)) => None,
            Err(error) => return Err(error),
        };

        if let Some(remote) = &existing {
            if remote.last_modified > envelope.last_modified {
                let context = ConflictContext {
                    remote_last_modified: remote.last_modified,
                    local_last_modified: envelope.last_modified,
                };
                let choice = self.resolver.resolve(&context);
                self.store
                    .append_conflict(ConflictEntry {
                        remote_last_modified: context.remote_last_modified,
                        local_last_modified: context.local_last_modified,
                        resolved_at: unix_timestamp_ms(),
                        choice: choice.as_str().to_string(),
                    })
                    .await?;
                tracing::info!(
                    "Sync conflict: remote {} > local {}; resolved as {}",
                    context.remote_last_modified,
                    context.local_last_modified,
                    choice.as_str()
                );

                if choice == ConflictChoice::LoadRemote {
                    // Pending push is discarded in favor of the remote state
                    return self.pull_inner(None).await;
                }
            }
        }

        let outcome = self
            .transport
            .push(&RemoteRecord::from_envelope(envelope.clone()))
            .await?;

        let synced_at = unix_timestamp_ms();
        self.store.set_last_sync(synced_at).await?;

        Ok(SyncReport {
            provider: self.transport.provider(),
            action: outcome.into(),
            device_id: envelope.device_id,
            synced_at,
            record_count: envelope.records.len(),
            believer_count: envelope.believers.len(),
        })
    }

    async fn pull_inner(&self, device_id: Option<&str>) -> Result<SyncReport> {
        let own_device = self.store.device_id().await?;
        let target = device_id.unwrap_or(&own_device);

        let row = self.transport.pull(target).await?;
        self.store.apply_envelope(&row.data).await?;

        let synced_at = unix_timestamp_ms();
        self.store.set_last_sync(synced_at).await?;

        Ok(SyncReport {
            provider: self.transport.provider(),
            action: SyncAction::Loaded,
            device_id: target.to_string(),
            synced_at,
            record_count: row.data.records.len(),
            believer_count: row.data.believers.len(),
        })
    }

    /// Push if local mutations are newer than the last sync.
    ///
    /// Failures are logged and swallowed; the transport's retry bound is
    /// the only retry. Returns whether a push ran and succeeded.
    pub async fn auto_sync(&self) -> bool {
        if !self.is_online() || self.in_flight.load(Ordering::SeqCst) {
            return false;
        }

        let (last_modified, last_sync) =
            match (self.store.last_modified().await, self.store.last_sync().await) {
                (Ok(modified), Ok(synced)) => (modified, synced),
                (Err(error), _) | (_, Err(error)) => {
                    tracing::warn!("Automatic sync skipped: {error}");
                    return false;
                }
            };

        let Some(last_modified) = last_modified else {
            return false;
        };
        if let Some(last_sync) = last_sync {
            if last_modified <= last_sync {
                return false;
            }
        }

        match self.sync_to_cloud().await {
            Ok(report) => {
                tracing::debug!("Automatic sync pushed {} records", report.record_count);
                true
            }
            Err(error) => {
                tracing::warn!("Automatic sync failed: {error}");
                false
            }
        }
    }

    pub async fn status(&self) -> Result<SyncStatus> {
        Ok(SyncStatus {
            online: self.is_online(),
            in_progress: self.in_flight.load(Ordering::SeqCst),
            device_id: self.store.device_id().await?,
            provider: self.transport.provider(),
            last_sync: self.store.last_sync().await?,
        })
    }

    /// The store this coordinator operates on
    pub const fn store(&self) -> &LocalStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use tokio::time::{sleep, Duration};

    use super::*;
    use crate::models::{Believer, FinancialRecord, RecordKind};
    use crate::sync::conflict::AlwaysOverwrite;
    use crate::sync::envelope::{SyncEnvelope, ENVELOPE_VERSION};
    use crate::sync::transport::LocalFallbackTransport;

    async fn coordinator_over(
        store: LocalStore,
        backend: LocalStore,
    ) -> SyncCoordinator<LocalFallbackTransport, AlwaysOverwrite> {
        SyncCoordinator::new(store, LocalFallbackTransport::new(backend), AlwaysOverwrite)
    }

    async fn single_store_coordinator(
    ) -> SyncCoordinator<LocalFallbackTransport, AlwaysOverwrite> {
        let store = LocalStore::open_in_memory().await.unwrap();
        coordinator_over(store.clone(), store).await
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_then_pull_round_trips_collections() {
        let coordinator = single_store_coordinator().await;
        let store = coordinator.store().clone();

        store
            .add_record(FinancialRecord::new(RecordKind::Income, "incense", 600))
            .await
            .unwrap();
        store.add_believer(Believer::new("Lin")).await.unwrap();

        let pushed = coordinator.sync_to_cloud().await.unwrap();
        assert_eq!(pushed.action, SyncAction::Created);
        assert_eq!(pushed.record_count, 1);

        let pulled = coordinator.sync_from_cloud(None).await.unwrap();
        assert_eq!(pulled.action, SyncAction::Loaded);
        assert_eq!(store.records().await.unwrap().len(), 1);
        assert_eq!(store.believers().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_push_without_mutation_is_identical_upsert() {
        let coordinator = single_store_coordinator().await;
        let store = coordinator.store().clone();

        store
            .add_record(FinancialRecord::new(RecordKind::Income, "incense", 600))
            .await
            .unwrap();

        let first = coordinator.sync_to_cloud().await.unwrap();
        assert_eq!(first.action, SyncAction::Created);
        let device_id = first.device_id.clone();

        let transport = LocalFallbackTransport::new(store.clone());
        let after_first = transport.pull(&device_id).await.unwrap();

        let second = coordinator.sync_to_cloud().await.unwrap();
        assert_eq!(second.action, SyncAction::Updated);

        let after_second = transport.pull(&device_id).await.unwrap();
        assert_eq!(after_second.data, after_first.data);
        assert_eq!(after_second.last_modified, after_first.last_modified);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_push_fails_fast() {
        let coordinator = single_store_coordinator().await;
        coordinator.notify_offline();

        let error = coordinator.sync_to_cloud().await.unwrap_err();
        assert!(matches!(error, Error::Offline));
        let error = coordinator.sync_from_cloud(None).await.unwrap_err();
        assert!(matches!(error, Error::Offline));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn newer_remote_invokes_resolver_before_overwrite() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let backend = store.clone();
        let device_id = store.device_id().await.unwrap();

        // Seed a remote row newer than local state
        let remote_envelope = SyncEnvelope {
            device_id: device_id.clone(),
            last_modified: 3_000,
            version: ENVELOPE_VERSION.to_string(),
            records: vec![FinancialRecord::new(RecordKind::Expense, "repairs", 990)],
            ..Default::default()
        };
        LocalFallbackTransport::new(backend.clone())
            .push(&RemoteRecord::from_envelope(remote_envelope))
            .await
            .unwrap();

        store
            .add_record(FinancialRecord::new(RecordKind::Income, "incense", 600))
            .await
            .unwrap();
        store.set_last_modified(2_000).await.unwrap();

        let invocations = AtomicUsize::new(0);
        let seen = Mutex::new(None);
        let resolver = |context: &ConflictContext| {
            invocations.fetch_add(1, Ordering::SeqCst);
            *seen.lock().unwrap() = Some(*context);
            ConflictChoice::LoadRemote
        };

        let coordinator = SyncCoordinator::new(
            store.clone(),
            LocalFallbackTransport::new(backend.clone()),
            resolver,
        );

        let report = coordinator.sync_to_cloud().await.unwrap();

        // Resolver consulted once with both timestamps
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        let context = seen.lock().unwrap().unwrap();
        assert_eq!(context.remote_last_modified, 3_000);
        assert_eq!(context.local_last_modified, 2_000);

        // LoadRemote discarded the pending push: remote row untouched,
        // local collections replaced by the remote envelope
        assert_eq!(report.action, SyncAction::Loaded);
        let remote_row = LocalFallbackTransport::new(backend)
            .pull(&device_id)
            .await
            .unwrap();
        assert_eq!(remote_row.last_modified, 3_000);
        let records = store.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "repairs");

        // Resolution recorded in the conflict log
        let log = store.conflicts().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].choice, "load-remote");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn overwrite_choice_pushes_over_newer_remote() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let backend = store.clone();
        let device_id = store.device_id().await.unwrap();

        let remote_envelope = SyncEnvelope {
            device_id: device_id.clone(),
            last_modified: 3_000,
            version: ENVELOPE_VERSION.to_string(),
            ..Default::default()
        };
        LocalFallbackTransport::new(backend.clone())
            .push(&RemoteRecord::from_envelope(remote_envelope))
            .await
            .unwrap();

        store
            .add_record(FinancialRecord::new(RecordKind::Income, "incense", 600))
            .await
            .unwrap();
        store.set_last_modified(2_000).await.unwrap();

        let coordinator = coordinator_over(store.clone(), backend.clone()).await;
        let report = coordinator.sync_to_cloud().await.unwrap();
        assert_eq!(report.action, SyncAction::Updated);

        let remote_row = LocalFallbackTransport::new(backend)
            .pull(&device_id)
            .await
            .unwrap();
        assert_eq!(remote_row.last_modified, 2_000);
        assert_eq!(remote_row.data.records.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn equal_timestamps_do_not_conflict() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let backend = store.clone();
        let device_id = store.device_id().await.unwrap();

        let remote_envelope = SyncEnvelope {
            device_id,
            last_modified: 2_000,
            version: ENVELOPE_VERSION.to_string(),
            ..Default::default()
        };
        LocalFallbackTransport::new(backend.clone())
            .push(&RemoteRecord::from_envelope(remote_envelope))
            .await
            .unwrap();
        store.set_last_modified(2_000).await.unwrap();

        let coordinator = coordinator_over(store.clone(), backend).await;
        coordinator.sync_to_cloud().await.unwrap();

        assert!(store.conflicts().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_sync_rejects_with_in_progress() {
        struct SlowTransport(LocalFallbackTransport);

        impl SyncTransport for SlowTransport {
            fn provider(&self) -> Provider {
                self.0.provider()
            }

            async fn pull(&self, device_id: &str) -> crate::Result<RemoteRecord> {
                sleep(Duration::from_millis(100)).await;
                self.0.pull(device_id).await
            }

            async fn push(&self, record: &RemoteRecord) -> crate::Result<PushOutcome> {
                self.0.push(record).await
            }
        }

        let store = LocalStore::open_in_memory().await.unwrap();
        let coordinator = SyncCoordinator::new(
            store.clone(),
            SlowTransport(LocalFallbackTransport::new(store)),
            AlwaysOverwrite,
        );

        let (first, second) =
            tokio::join!(coordinator.sync_to_cloud(), async {
                // Give the first call time to take the guard
                sleep(Duration::from_millis(10)).await;
                coordinator.sync_to_cloud().await
            });

        assert!(first.is_ok());
        assert!(matches!(second.unwrap_err(), Error::SyncInProgress));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pull_rotates_backups_to_retention_bound() {
        let coordinator = single_store_coordinator().await;
        let store = coordinator.store().clone();

        store
            .add_record(FinancialRecord::new(RecordKind::Income, "incense", 600))
            .await
            .unwrap();
        coordinator.sync_to_cloud().await.unwrap();

        for _ in 0..7 {
            coordinator.sync_from_cloud(None).await.unwrap();
            sleep(Duration::from_millis(2)).await;
        }

        assert_eq!(
            store.backup_keys().await.unwrap().len(),
            crate::store::BACKUP_RETENTION
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_device_pulls_first_devices_rows() {
        let backend = LocalStore::open_in_memory().await.unwrap();
        let first = coordinator_over(backend.clone(), backend.clone()).await;

        backend
            .add_record(FinancialRecord::new(RecordKind::Income, "incense", 600))
            .await
            .unwrap();
        let report = first.sync_to_cloud().await.unwrap();
        let first_device = report.device_id;

        let second_store = LocalStore::open_in_memory().await.unwrap();
        let second = coordinator_over(second_store.clone(), backend).await;

        assert!(second_store.records().await.unwrap().is_empty());
        second.sync_from_cloud(Some(&first_device)).await.unwrap();

        let records = second_store.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "incense");

        // Own identity is kept after a foreign pull
        assert_ne!(second_store.device_id().await.unwrap(), first_device);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn auto_sync_pushes_only_when_dirty() {
        let coordinator = single_store_coordinator().await;
        let store = coordinator.store().clone();

        // Nothing modified yet
        assert!(!coordinator.auto_sync().await);

        store
            .add_record(FinancialRecord::new(RecordKind::Income, "incense", 600))
            .await
            .unwrap();
        assert!(coordinator.auto_sync().await);

        // Synced state is clean again
        assert!(!coordinator.auto_sync().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn notify_online_triggers_push_on_transition() {
        let coordinator = single_store_coordinator().await;
        let store = coordinator.store().clone();

        coordinator.notify_offline();
        store
            .add_record(FinancialRecord::new(RecordKind::Expense, "supplies", 250))
            .await
            .unwrap();

        assert!(coordinator.notify_online().await);
        // Already online: no transition, no push
        assert!(!coordinator.notify_online().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_reports_markers_and_provider() {
        let coordinator = single_store_coordinator().await;

        let before = coordinator.status().await.unwrap();
        assert!(before.online);
        assert!(!before.in_progress);
        assert_eq!(before.provider, Provider::LocalFallback);
        assert_eq!(before.last_sync, None);

        coordinator.sync_to_cloud().await.unwrap();
        let after = coordinator.status().await.unwrap();
        assert!(after.last_sync.is_some());
    }
}
