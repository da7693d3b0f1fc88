//! Query-string sync handshake.
//!
//! A device shares a URL (typically rendered as a QR code) carrying its
//! device identifier and backend tag. The receiving side parses the URL
//! and, when the identifier is foreign, asks the user before pulling
//! that device's data.

use crate::error::{Error, Result};
use crate::sync::transport::Provider;

/// Query parameter carrying the sharing device's identifier
pub const DEVICE_ID_PARAM: &str = "device_id";
/// Query parameter carrying the sharing device's backend tag
pub const PROVIDER_PARAM: &str = "sync_provider";

/// A parsed handshake from a shared URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    pub device_id: String,
    /// Backend tag the sharing device was using, when present
    pub provider: Option<String>,
}

impl HandshakeRequest {
    /// Whether the handshake refers to a device other than the local one
    #[must_use]
    pub fn is_foreign(&self, local_device_id: &str) -> bool {
        self.device_id != local_device_id
    }
}

/// Build a shareable URL carrying the local device id and backend tag.
pub fn share_url(base_url: &str, device_id: &str, provider: Provider) -> Result<String> {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return Err(Error::InvalidInput(
            "share base URL must not be empty".to_string(),
        ));
    }

    let separator = if base_url.contains('?') { '&' } else { '?' };
    Ok(format!(
        "{base_url}{separator}{DEVICE_ID_PARAM}={}&{PROVIDER_PARAM}={}",
        urlencoding::encode(device_id),
        provider.tag()
    ))
}

/// Extract a handshake from a shared URL.
///
/// Returns `Ok(None)` when the URL carries no device identifier; malformed
/// percent-encoding is an input error.
pub fn parse_share_url(url: &str) -> Result<Option<HandshakeRequest>> {
    let Some(query) = url.splitn(2, '?').nth(1) else {
        return Ok(None);
    };
    let query = query.split('#').next().unwrap_or_default();

    let mut device_id = None;
    let mut provider = None;
    for pair in query.split('&') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let decoded = urlencoding::decode(value)
            .map_err(|error| Error::InvalidInput(format!("malformed share URL: {error}")))?
            .into_owned();

        match name {
            DEVICE_ID_PARAM => device_id = Some(decoded),
            PROVIDER_PARAM => provider = Some(decoded),
            _ => {}
        }
    }

    Ok(device_id
        .filter(|id| !id.trim().is_empty())
        .map(|device_id| HandshakeRequest {
            device_id,
            provider,
        }))
}
