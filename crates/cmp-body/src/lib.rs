//! # Body Processor
//!
//! Decodes and encodes every `PKIBody` variant this core handles, and
//! hosts the request/response domain types, the legacy/CMS certificate
//! delivery recovery, and the server-side IR reconciliation rules.

pub mod body;
pub mod body_tag;
pub mod confirm;
pub mod domain;
pub mod error;
pub mod general;
pub mod oids;
pub mod reconcile;
pub mod requests;
pub mod response;

pub use body::{decode, encode, PkiBody};
pub use confirm::CertConfirmation;
pub use error::ErrorBody;
