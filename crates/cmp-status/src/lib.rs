//! # PKI Status Decoder
//!
//! Translates `PKIStatusInfo` into the host error taxonomy, with its own
//! failure-bit priority mapping.

pub mod info;

pub use info::PkiStatusInfo;
