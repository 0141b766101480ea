//! The CMP error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::failinfo::FailInfoFlags;

/// Detail carried alongside a taxonomy class, sourced from the peer's
/// `PKIStatusInfo` when one was present: its integer status if any, its
/// failure-bit set if any, and any free text, plus a flag for whether
/// the detail came from an unauthenticated `error` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerDetail {
    pub status: Option<i32>,
    pub fail_info: Option<FailInfoFlags>,
    pub peer_text: Option<String>,
    /// Set when the detail came from an `error` PKIBody that was returned
    /// to the caller without integrity verification.
    pub unauthenticated: bool,
}

impl PeerDetail {
    pub fn none() -> Self {
        Self::default()
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(status) = self.status {
            parts.push(format!("peer status {status}"));
        }
        if let Some(fail_info) = self.fail_info {
            if !fail_info.is_empty() {
                parts.push(fail_info.to_text());
            }
        }
        if let Some(text) = &self.peer_text {
            parts.push(format!("peer message: {text}"));
        }
        if self.unauthenticated {
            parts.push("unauthenticated".to_string());
        }
        parts.join("; ")
    }
}

/// Host error taxonomy for the CMP core.
///
/// `Display` renders the locally-assigned description only; use
/// [`CmpError::detail`] or [`CmpError::full_description`] to surface the
/// peer's status/fail-info/free-text as well.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CmpError {
    /// Malformed ASN.1, unexpected tag, length overflow/underflow, OID arc
    /// overflow.
    #[error("malformed CMP data: {description}")]
    BadData { description: String, detail: PeerDetail },

    /// Integrity verification failed: MAC mismatch, signature invalid,
    /// signer identity mismatch, missing protection, nonce/transaction-ID
    /// mismatch.
    #[error("integrity verification failed: {description}")]
    Signature { description: String, detail: PeerDetail },

    /// The key presented does not match the one expected.
    #[error("wrong key: {description}")]
    WrongKey { description: String, detail: PeerDetail },

    /// Peer rejected the request as unauthorised.
    #[error("not permitted: {description}")]
    Permission { description: String, detail: PeerDetail },

    /// Template or policy rejected.
    #[error("invalid request: {description}")]
    Invalid { description: String, detail: PeerDetail },

    /// Transaction ID in use, or duplicate certificate request.
    #[error("duplicate: {description}")]
    Duplicate { description: String, detail: PeerDetail },

    /// Algorithm not supported.
    #[error("algorithm not available: {description}")]
    NotAvailable { description: String, detail: PeerDetail },

    /// Transport did not produce a response within the session's timeout
    /// budget.
    #[error("timed out: {description}")]
    Timeout { description: String },

    /// Generic protocol failure — catch-all for `PKIStatusInfo` rejections
    /// not matching a more specific class.
    #[error("protocol failure: {description}")]
    Failed { description: String, detail: PeerDetail },
}

impl CmpError {
    pub fn bad_data(description: impl Into<String>) -> Self {
        CmpError::BadData { description: description.into(), detail: PeerDetail::none() }
    }

    pub fn bad_data_with(description: impl Into<String>, detail: PeerDetail) -> Self {
        CmpError::BadData { description: description.into(), detail }
    }

    pub fn signature(description: impl Into<String>) -> Self {
        CmpError::Signature { description: description.into(), detail: PeerDetail::none() }
    }

    pub fn signature_with(description: impl Into<String>, detail: PeerDetail) -> Self {
        CmpError::Signature { description: description.into(), detail }
    }

    pub fn timeout(description: impl Into<String>) -> Self {
        CmpError::Timeout { description: description.into() }
    }

    /// Returns the `PeerDetail` attached to this error, if any (`Timeout`
    /// carries none).
    pub fn detail(&self) -> Option<&PeerDetail> {
        match self {
            CmpError::BadData { detail, .. }
            | CmpError::Signature { detail, .. }
            | CmpError::WrongKey { detail, .. }
            | CmpError::Permission { detail, .. }
            | CmpError::Invalid { detail, .. }
            | CmpError::Duplicate { detail, .. }
            | CmpError::NotAvailable { detail, .. }
            | CmpError::Failed { detail, .. } => Some(detail),
            CmpError::Timeout { .. } => None,
        }
    }

    /// The local description plus the peer's status/fail-info/free-text,
    /// when present — the full user-visible rendering of the error.
    pub fn full_description(&self) -> String {
        match self.detail() {
            Some(detail) => {
                let suffix = detail.describe();
                if suffix.is_empty() {
                    self.to_string()
                } else {
                    format!("{self} ({suffix})")
                }
            }
            None => self.to_string(),
        }
    }
}
