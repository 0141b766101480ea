//! # Integrity Context
//!
//! MAC and signature-based protection for `PKIMessage`, including the
//! iterated-hash MAC key derivation bound, the alternate-MAC-parameter
//! cache, and raw-signature verification over a precomputed digest.

pub mod mac;
pub mod sig;

pub use mac::{MacContext, MacParams, MacSlots};
pub use sig::{SigContext, SignerReference};

/// The integrity mode a session is configured with.
#[derive(Debug, Clone)]
pub enum Integrity {
    Mac(MacSlots),
    Sig(SigContext),
}
