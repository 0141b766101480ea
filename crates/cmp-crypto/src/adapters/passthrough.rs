//! A test double for [`crate::ports::envelope::EnvelopeOpener`].
//!
//! This is explicitly not a CMS parser. It exists so the integration
//! suite can exercise the `newEncryptedCert` code path in `cmp-body`
//! without pulling in a real CMS implementation, which sits outside
//! this core's scope.

use cmp_types::CmpError;

use crate::ports::envelope::EnvelopeOpener;

/// Treats the `EnvelopedData` DER as if it already were the plaintext
/// certificate. Fixtures that exercise this path wrap the plaintext in a
/// `SEQUENCE` so the body processor's TLV walk still has something
/// well-formed to step over.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughEnvelopeOpener;

impl PassthroughEnvelopeOpener {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl EnvelopeOpener for PassthroughEnvelopeOpener {
    async fn open_enveloped_data(&self, der: &[u8]) -> Result<Vec<u8>, CmpError> {
        if der.is_empty() {
            return Err(CmpError::bad_data("empty EnvelopedData"));
        }
        Ok(der.to_vec())
    }
}
