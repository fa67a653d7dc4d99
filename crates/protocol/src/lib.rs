//! Wire types for the deadline proxy API.
//!
//! This crate contains the serde-serializable types exchanged between the
//! proxy and its clients: per-endpoint request bodies, the response
//! envelope, and the normalized assignment/homework records.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond (de)serialization and boundary
//!   validation of request bodies
//! * Stable: Changes only when the client-facing JSON shapes change
//!
//! Everything that talks to an upstream lives in `dlp-core`; everything
//! that routes HTTP lives in `dlp-server`.

pub mod envelope;
pub mod record;
pub mod request;

pub use envelope::*;
pub use record::*;
pub use request::*;
