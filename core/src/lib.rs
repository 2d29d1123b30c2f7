//! Core components for signing and verifying API requests.
//!
//! This crate provides the protocol-agnostic building blocks for iasign:
//!
//! - [`SigningRequest`]: the view of a request that signatures are computed over
//! - [`Context`]: a container for file reading and environment access
//! - [`Error`]: the error type shared by all iasign crates
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time formatting and parsing utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{Context, Env, FileRead, NoopEnv, NoopFileRead, OsEnv, StaticEnv};

mod error;
pub use error::{Error, ErrorKind, Result};

mod request;
pub use request::{normalize_path, SigningRequest};
