//! # OID Codec
//!
//! Converts between DER `OBJECT IDENTIFIER` encodings and dotted-decimal
//! text, with bounds and overflow checks on arc values and text length.

pub mod codec;

pub use codec::{oid_to_text, text_to_oid};
