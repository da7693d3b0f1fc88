//! Transport adapter: one `push`/`pull` surface over two backends.
//!
//! The cloud transport speaks the hosted table's REST dialect
//! (PostgREST-style: filtered selects, upsert as update-or-insert). The
//! local fallback serves the same calls from kv rows so sync keeps
//! working without connectivity or configuration.

use std::future::Future;

use reqwest::StatusCode;
use serde::Deserialize;
use tokio::time::sleep;

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::store::{keys, LocalStore};
use crate::util::compact_text;

use super::envelope::RemoteRecord;

/// Which backend currently serves sync traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Cloud,
    LocalFallback,
}

impl Provider {
    /// Short tag used in share URLs and status output
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::LocalFallback => "local",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Whether a push created the device's row or updated it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Created,
    Updated,
}

/// Backend-neutral sync operations
#[allow(async_fn_in_trait)]
pub trait SyncTransport {
    /// Which backend serves this transport
    fn provider(&self) -> Provider;

    /// Fetch the most recent row for a device.
    ///
    /// Fails with [`Error::NotFound`] when the device has never pushed.
    async fn pull(&self, device_id: &str) -> Result<RemoteRecord>;

    /// Upsert the device's row
    async fn push(&self, record: &RemoteRecord) -> Result<PushOutcome>;
}

// ---------------------------------------------------------------------------
// Cloud transport
// ---------------------------------------------------------------------------

/// HTTP transport against the hosted sync table
pub struct CloudTransport {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl CloudTransport {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| Error::Network(error.to_string()))?;
        Ok(Self { client, config })
    }

    /// Lightweight connectivity query bounded by the probe timeout.
    ///
    /// Schema and permission failures surface as their typed variants so
    /// callers can distinguish "unreachable" from "misconfigured".
    pub async fn probe(&self) -> Result<()> {
        let response = self
            .request(reqwest::Method::GET, &self.rows_url())
            .query(&[("select", "device_id"), ("limit", "1")])
            .timeout(self.config.probe_timeout)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_response(status, &body))
        }
    }

    fn rows_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url, self.config.table_name
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn device_filter(device_id: &str) -> String {
        format!("eq.{}", urlencoding::encode(device_id))
    }

    /// Retry transient failures up to the configured bound with linearly
    /// increasing delay. Data-shape failures surface immediately.
    async fn retrying<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.config.retry_attempts => {
                    let delay = self.config.retry_delay * attempt;
                    tracing::warn!(
                        "{operation} attempt {attempt} failed: {error}; retrying in {delay:?}"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn fetch_existing(&self, device_id: &str) -> Result<Option<RemoteRecord>> {
        let response = self
            .request(reqwest::Method::GET, &self.rows_url())
            .query(&[
                ("select", "*"),
                ("device_id", Self::device_filter(device_id).as_str()),
                ("order", "updated_at.desc"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_response(status, &body));
        }

        let mut rows: Vec<RemoteRecord> = response
            .json()
            .await
            .map_err(|error| Error::Network(format!("invalid row payload: {error}")))?;
        Ok(rows.pop())
    }

    async fn upsert_once(&self, record: &RemoteRecord) -> Result<PushOutcome> {
        let existing = self.fetch_existing(&record.device_id).await?;
        let now_iso = chrono::Utc::now().to_rfc3339();

        let mut row = record.clone();
        row.updated_at = Some(now_iso.clone());

        let response = if existing.is_some() {
            self.request(reqwest::Method::PATCH, &self.rows_url())
                .query(&[(
                    "device_id",
                    Self::device_filter(&record.device_id).as_str(),
                )])
                .header("Prefer", "return=minimal")
                .json(&row)
                .send()
                .await
        } else {
            row.created_at = Some(now_iso);
            self.request(reqwest::Method::POST, &self.rows_url())
                .header("Prefer", "return=minimal")
                .json(&[row])
                .send()
                .await
        }
        .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_response(status, &body));
        }

        Ok(if existing.is_some() {
            PushOutcome::Updated
        } else {
            PushOutcome::Created
        })
    }
}

impl SyncTransport for CloudTransport {
    fn provider(&self) -> Provider {
        Provider::Cloud
    }

    async fn pull(&self, device_id: &str) -> Result<RemoteRecord> {
        self.retrying("pull", || async {
            self.fetch_existing(device_id)
                .await?
                .ok_or_else(|| Error::NotFound(device_id.to_string()))
        })
        .await
    }

    async fn push(&self, record: &RemoteRecord) -> Result<PushOutcome> {
        self.retrying("push", || self.upsert_once(record)).await
    }
}

/// Error body shape returned by the hosted table API
#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    code: Option<String>,
    message: Option<String>,
    hint: Option<String>,
}

/// Map an HTTP failure onto a typed error variant.
///
/// Classification happens here, from status plus the backend's structured
/// error code; callers never inspect message text.
fn classify_response(status: StatusCode, body: &str) -> Error {
    let parsed: Option<BackendErrorBody> = serde_json::from_str(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|body| body.code.as_deref())
        .unwrap_or_default();
    let message = parsed
        .as_ref()
        .and_then(|body| body.message.clone().or_else(|| body.hint.clone()))
        .unwrap_or_else(|| compact_text(body));
    let detail = if message.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", message, status.as_u16())
    };

    // 42P01 = undefined table; PGRST2xx = relation missing from schema cache
    if code == "42P01" || code.starts_with("PGRST2") || status == StatusCode::NOT_FOUND {
        return Error::Schema(detail);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Error::Permission(detail);
    }
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        return Error::Timeout(detail);
    }

    Error::Network(detail)
}

fn classify_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout(error.to_string())
    } else {
        Error::Network(error.to_string())
    }
}

// ---------------------------------------------------------------------------
// Local fallback transport
// ---------------------------------------------------------------------------

/// Fallback serving push/pull from kv rows keyed `cloud-{deviceId}`
pub struct LocalFallbackTransport {
    store: LocalStore,
}

impl LocalFallbackTransport {
    #[must_use]
    pub const fn new(store: LocalStore) -> Self {
        Self { store }
    }

    fn cloud_key(device_id: &str) -> String {
        format!("{}{device_id}", keys::CLOUD_PREFIX)
    }
}

impl SyncTransport for LocalFallbackTransport {
    fn provider(&self) -> Provider {
        Provider::LocalFallback
    }

    async fn pull(&self, device_id: &str) -> Result<RemoteRecord> {
        let Some(raw) = self.store.get_raw(&Self::cloud_key(device_id)).await? else {
            return Err(Error::NotFound(device_id.to_string()));
        };
        Ok(serde_json::from_str(&raw)?)
    }

    async fn push(&self, record: &RemoteRecord) -> Result<PushOutcome> {
        let key = Self::cloud_key(&record.device_id);
        let existed = self.store.get_raw(&key).await?.is_some();

        let mut row = record.clone();
        let now_iso = chrono::Utc::now().to_rfc3339();
        if !existed {
            row.created_at = Some(now_iso.clone());
        }
        row.updated_at = Some(now_iso);

        self.store
            .set_raw(&key, &serde_json::to_string(&row)?)
            .await?;
        Ok(if existed {
            PushOutcome::Updated
        } else {
            PushOutcome::Created
        })
    }
}

// ---------------------------------------------------------------------------
// Startup selection
// ---------------------------------------------------------------------------

/// Backend selected at startup
pub enum Transport {
    Cloud(CloudTransport),
    Local(LocalFallbackTransport),
}

impl Transport {
    /// Pick the backend: cloud when configured and reachable, local
    /// otherwise.
    ///
    /// Probe timeouts and network failures downgrade to the fallback;
    /// schema and permission failures surface so misconfiguration is not
    /// mistaken for being offline.
    pub async fn select(config: Option<RemoteConfig>, store: &LocalStore) -> Result<Self> {
        let Some(config) = config else {
            tracing::info!("No remote config; using local fallback transport");
            return Ok(Self::Local(LocalFallbackTransport::new(store.clone())));
        };

        let cloud = CloudTransport::new(config)?;
        match cloud.probe().await {
            Ok(()) => {
                tracing::info!("Cloud transport ready");
                Ok(Self::Cloud(cloud))
            }
            Err(error @ (Error::Schema(_) | Error::Permission(_))) => Err(error),
            Err(error) => {
                tracing::warn!("Cloud probe failed ({error}); using local fallback transport");
                Ok(Self::Local(LocalFallbackTransport::new(store.clone())))
            }
        }
    }
}

impl SyncTransport for Transport {
    fn provider(&self) -> Provider {
        match self {
            Self::Cloud(transport) => transport.provider(),
            Self::Local(transport) => transport.provider(),
        }
    }

    async fn pull(&self, device_id: &str) -> Result<RemoteRecord> {
        match self {
            Self::Cloud(transport) => transport.pull(device_id).await,
            Self::Local(transport) => transport.pull(device_id).await,
        }
    }

    async fn push(&self, record: &RemoteRecord) -> Result<PushOutcome> {
        match self {
            Self::Cloud(transport) => transport.push(record).await,
            Self::Local(transport) => transport.push(record).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::envelope::{SyncEnvelope, ENVELOPE_VERSION};
    use pretty_assertions::assert_eq;

    fn sample_record(device_id: &str, last_modified: i64) -> RemoteRecord {
        RemoteRecord::from_envelope(SyncEnvelope {
            device_id: device_id.to_string(),
            last_modified,
            version: ENVELOPE_VERSION.to_string(),
            ..Default::default()
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn local_pull_without_row_is_not_found() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let transport = LocalFallbackTransport::new(store);

        let error = transport.pull("device-missing").await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn local_push_then_pull_round_trips() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let transport = LocalFallbackTransport::new(store);

        let record = sample_record("device-a", 1_000);
        let outcome = transport.push(&record).await.unwrap();
        assert_eq!(outcome, PushOutcome::Created);

        let pulled = transport.pull("device-a").await.unwrap();
        assert_eq!(pulled.data, record.data);
        assert_eq!(pulled.last_modified, 1_000);
        assert!(pulled.created_at.is_some());

        let outcome = transport.push(&record).await.unwrap();
        assert_eq!(outcome, PushOutcome::Updated);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn select_without_config_uses_fallback() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let transport = Transport::select(None, &store).await.unwrap();
        assert_eq!(transport.provider(), Provider::LocalFallback);
    }

    #[test]
    fn classify_response_maps_missing_table_to_schema() {
        let body = r#"{"code":"42P01","message":"relation \"public.temple_data\" does not exist"}"#;
        let error = classify_response(StatusCode::BAD_REQUEST, body);
        assert!(matches!(error, Error::Schema(_)));

        let body = r#"{"code":"PGRST205","message":"Could not find the table"}"#;
        let error = classify_response(StatusCode::NOT_FOUND, body);
        assert!(matches!(error, Error::Schema(_)));
    }

    #[test]
    fn classify_response_maps_policy_rejection_to_permission() {
        let body = r#"{"code":"42501","message":"permission denied for table temple_data"}"#;
        let error = classify_response(StatusCode::FORBIDDEN, body);
        assert!(matches!(error, Error::Permission(_)));
    }

    #[test]
    fn classify_response_defaults_to_network() {
        let error = classify_response(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded");
        assert!(matches!(error, Error::Network(_)));
        assert!(error.is_transient());
    }
}
