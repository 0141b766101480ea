//! # Crypto Backend Ports
//!
//! The external capabilities this core treats as "assumed available":
//! hashing/MAC/signature-verify primitives, certificate introspection, and
//! CMS envelope handling. This crate defines the ports every other
//! component calls through, and ships a RustCrypto-backed adapter so the
//! workspace is runnable without a caller-supplied backend.

pub mod adapters;
pub mod ports;

pub use adapters::{PassthroughEnvelopeOpener, RustCryptoProvider};
pub use ports::{CertificateHandle, CryptoProvider, EnvelopeOpener, HashAlgorithm};
