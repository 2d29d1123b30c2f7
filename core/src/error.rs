use std::fmt;
use thiserror::Error;

/// Error returned by every iasign crate.
///
/// `kind` tells callers what failed, `message` is meant for operators.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

/// ErrorKind classifies an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value passed to a constructor is empty or incomplete.
    InvalidArgument,

    /// Credential contents to load are empty.
    EmptyCredentialInput,
    /// A credential line does not carry both a secret key and a public key.
    MalformedCredentialLine,
    /// The credential file path is empty or can't be read.
    CredentialFileNotFound,
    /// Verification was attempted against a store without credentials.
    EmptyCredentialStore,

    /// The authorization header value is empty.
    EmptyAuthorizationHeader,
    /// The authorization header doesn't match the wire grammar.
    MalformedAuthorizationHeader,
    /// The credential token isn't `KEYID/DATE`.
    InvalidCredentialFormat,

    /// A header required for verification is absent.
    MissingRequiredHeader,
    /// The `x-amz-date` value can't be parsed.
    MalformedRequestDate,
    /// The request timestamp is outside of the accepted window.
    ClockSkewExceeded,
    /// The public key referenced by the request is not in the store.
    UnknownCredential,
    /// The credential date doesn't match the request date.
    CredentialDateMismatch,
    /// The recomputed authorization header differs from the received one.
    SignatureMismatch,

    /// The request body is not a valid operation envelope or record.
    MalformedRequestBody,
    /// The operation tag is not part of the supported set.
    UnsupportedOperation,
    /// No handler is registered for the operation.
    NoHandlerRegistered,
    /// The handler returned an error.
    HandlerFailed,
    /// The handler returned a response for another operation.
    InvalidResponseType,

    /// Unexpected errors (I/O, formatting, serialization, etc.)
    Unexpected,
}

impl Error {
    /// Build an error of `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the error that caused this one.
    pub fn with_source(self, source: impl Into<anyhow::Error>) -> Self {
        Error {
            source: Some(source.into()),
            ..self
        }
    }

    /// What went wrong.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Check if this error means the request failed authentication.
    ///
    /// These are the expected outcomes of verifying untrusted input, as opposed
    /// to misconfiguration such as an empty credential store.
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::EmptyAuthorizationHeader
                | ErrorKind::MalformedAuthorizationHeader
                | ErrorKind::InvalidCredentialFormat
                | ErrorKind::MissingRequiredHeader
                | ErrorKind::MalformedRequestDate
                | ErrorKind::ClockSkewExceeded
                | ErrorKind::UnknownCredential
                | ErrorKind::CredentialDateMismatch
                | ErrorKind::SignatureMismatch
        )
    }

    /// [`ErrorKind::InvalidArgument`] error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// [`ErrorKind::Unexpected`] error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::EmptyCredentialInput => "empty credential input",
            ErrorKind::MalformedCredentialLine => "malformed credential line",
            ErrorKind::CredentialFileNotFound => "credential file not found",
            ErrorKind::EmptyCredentialStore => "empty credential store",
            ErrorKind::EmptyAuthorizationHeader => "empty authorization header",
            ErrorKind::MalformedAuthorizationHeader => "malformed authorization header",
            ErrorKind::InvalidCredentialFormat => "invalid credential format",
            ErrorKind::MissingRequiredHeader => "missing required header",
            ErrorKind::MalformedRequestDate => "malformed request date",
            ErrorKind::ClockSkewExceeded => "clock skew exceeded",
            ErrorKind::UnknownCredential => "unknown credential",
            ErrorKind::CredentialDateMismatch => "credential date mismatch",
            ErrorKind::SignatureMismatch => "signature mismatch",
            ErrorKind::MalformedRequestBody => "malformed request body",
            ErrorKind::UnsupportedOperation => "unsupported operation",
            ErrorKind::NoHandlerRegistered => "no handler registered",
            ErrorKind::HandlerFailed => "handler failed",
            ErrorKind::InvalidResponseType => "invalid response type",
            ErrorKind::Unexpected => "unexpected error",
        };
        f.write_str(s)
    }
}

/// Result with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

macro_rules! impl_from_unexpected {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(err: $ty) -> Self {
                    Error::unexpected(err.to_string()).with_source(err)
                }
            }
        )+
    };
}

impl_from_unexpected!(
    anyhow::Error,
    std::io::Error,
    std::fmt::Error,
    std::string::FromUtf8Error,
    http::header::InvalidHeaderName,
    http::header::InvalidHeaderValue,
    http::uri::InvalidUri,
);
