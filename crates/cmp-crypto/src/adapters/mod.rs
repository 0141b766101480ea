pub mod passthrough;
pub mod rust_crypto;

pub use passthrough::PassthroughEnvelopeOpener;
pub use rust_crypto::RustCryptoProvider;
