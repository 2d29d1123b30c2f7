//! Instant Access request signing and dispatching.
//!
//! - [`RequestSigner`] signs and verifies requests with `DTA1-HMAC-SHA256`.
//! - [`CredentialStore`] holds the credentials requests are verified against.
//! - [`Dispatcher`] verifies incoming requests and routes them to handlers.

pub mod constants;

mod authorization;
pub use authorization::{AuthorizationHeader, CredentialScope};

mod config;
pub use config::Config;

mod credential;
pub use credential::{Credential, CredentialStore};

mod dispatch;
pub use dispatch::{DispatchState, Dispatcher, Handle};

mod load;
pub use load::load_credential_store;

mod log_sink;
pub use log_sink::{LogFacade, LogSink, NoopLogSink, DISPATCH_LOG_TARGET};

mod model;
pub use model::*;

mod operation;
pub use operation::*;

mod sign_request;
pub use sign_request::{canonical_request, RequestSigner};
