//! Error types for the registry transport.

use http::StatusCode;
use thiserror::Error;

use crate::diagnostics::DiagnosticError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The action supplied for a transport is not one of the recognized values.
#[derive(Debug, Clone, Error)]
#[error("invalid action: {0:?}")]
pub struct InvalidAction(pub(crate) String);

/// The registry responded in a way that violates the v2 protocol.
///
/// These errors represent broken invariants rather than ordinary request
/// failures, and are never retried.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The opening ping returned something other than 200 or 401.
    #[error("unexpected response pinging the registry: {status}\nBody: {body}")]
    UnexpectedPingStatus {
        /// Status returned by the ping.
        status: StatusCode,
        /// Collected response body, for the error report.
        body: String,
    },

    /// The ping returned 401 without a `www-authenticate` header.
    #[error("missing \"www-authenticate\" header on an unauthorized ping")]
    MissingChallenge,

    /// The `www-authenticate` header is not of the `<scheme> <params>` form.
    #[error("unexpected \"www-authenticate\" header form: {0:?}")]
    MalformedChallenge(String),

    /// The challenge names a scheme other than Basic or Bearer.
    #[error("unexpected \"www-authenticate\" challenge type: {0:?}")]
    UnsupportedChallengeScheme(String),

    /// A Bearer challenge did not include a realm to exchange tokens with.
    #[error("expected a realm in the \"www-authenticate\" header: {0:?}")]
    MissingRealm(String),

    /// The token exchange returned 200, but the body held no usable token.
    #[error("malformed token exchange response: {0}")]
    MalformedTokenResponse(String),
}

/// An error from a registry transport operation.
#[derive(Debug, Error)]
pub enum Error {
    /// An unrecognized action string.
    #[error(transparent)]
    Action(#[from] InvalidAction),

    /// A protocol invariant was violated.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The credential exchange with the authorization realm failed.
    #[error("bad status during token exchange: {status}\n{body}")]
    TokenRefresh {
        /// Status returned by the realm.
        status: StatusCode,
        /// Collected response body, for the error report.
        body: String,
    },

    /// The registry rejected a request with a diagnosable error body.
    #[error(transparent)]
    Diagnostic(#[from] DiagnosticError),

    /// The underlying HTTP client failed to issue the request.
    #[error("request failed: {0}")]
    Request(#[from] hyperdriver::client::Error),

    /// The response body could not be collected.
    #[error("error reading response body: {0}")]
    Body(#[source] BoxError),

    /// A URL assembled from registry-supplied parts was invalid.
    #[error("invalid URI: {0}")]
    Uri(#[from] http::uri::InvalidUri),

    /// The request could not be constructed.
    #[error(transparent)]
    Http(#[from] http::Error),
}
