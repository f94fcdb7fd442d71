//! Errors returned by the Bling API client.

use thiserror::Error;

/// Failure of a single call against the Bling API.
#[derive(Debug, Error)]
pub enum BlingError {
    /// Connection failure, timeout, or an interrupted body read.
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The outgoing record could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body is not the JSON shape the endpoint returns.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The service answered with a status other than the one the call expects.
    /// The body is kept verbatim for diagnostics.
    #[error("Bling API error ({status}): {body}")]
    RemoteStatus { status: u16, body: String },

    /// The downloaded document does not start with the PDF magic marker.
    #[error("response is not a valid PDF ({len} bytes, starts with {prefix:?})")]
    InvalidFormat { len: usize, prefix: String },
}

impl BlingError {
    /// Builds an [`BlingError::InvalidFormat`] describing the offending bytes.
    pub(crate) fn invalid_format(bytes: &[u8]) -> Self {
        let prefix = String::from_utf8_lossy(&bytes[..bytes.len().min(8)]).into_owned();
        BlingError::InvalidFormat {
            len: bytes.len(),
            prefix,
        }
    }

    /// HTTP status carried by the error, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BlingError::RemoteStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
