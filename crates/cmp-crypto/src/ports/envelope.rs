//! Driven port delegating CMS `EnvelopedData` handling to an external
//! capability, for the `newEncryptedCert` delivery form.

use cmp_types::CmpError;

/// Opens a CMS `EnvelopedData` structure and returns the recovered
/// plaintext certificate bytes. Implementations may wrap an async CMS
/// backend, hence `async_trait` rather than a plain sync method.
#[async_trait::async_trait]
pub trait EnvelopeOpener: Send + Sync {
    async fn open_enveloped_data(&self, der: &[u8]) -> Result<Vec<u8>, CmpError>;
}
