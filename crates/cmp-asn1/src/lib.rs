//! # CMP ASN.1/DER Primitives
//!
//! A minimal, hand-rolled DER tag/length/value cursor and matching writer,
//! shared by every crate that reads or writes a piece of a `PKIMessage`,
//! including the on-the-wire byte capture needed for raw signatures.

pub mod reader;
pub mod tag;
pub mod writer;

pub use reader::Reader;
