//! # Integration Tests
//!
//! End-to-end exercises of [`cmp_session::Session`] against hand-built
//! server fixtures standing in for a CA/RA, wired together with an
//! in-process transport instead of a real socket.
//!
//! ## Structure
//!
//! - `loopback`: [`loopback::LoopbackTransport`], the signer/MAC-backed
//!   fixtures (`MacCa`, `SigCa`), and the scenario tests themselves.

pub mod loopback;
