//! Credentials for registry requests.
//!
//! The `Credential` trait has a single capability: produce an optional
//! `Authorization` header value. Three variants exist:
//! - [`Credentials::Anonymous`] for unauthenticated registries
//! - [`BasicCredentials`] for static Basic authentication
//! - [`BearerToken`] for tokens issued by an authorization realm

use std::fmt;

use http::HeaderValue;
use zeroize::Zeroize;

/// Create a basic authentication header value, with the password being optional.
///
/// Basic authentication Base64 encodes the username and password, separated
/// by a colon.
///
/// # Example
/// ```rust
/// use registry_transport::basic_auth;
///
/// let header = basic_auth("username", Some("password"));
/// assert_eq!(header.to_str().unwrap(), "Basic dXNlcm5hbWU6cGFzc3dvcmQ=");
/// ```
pub fn basic_auth<U, P>(username: U, password: Option<P>) -> HeaderValue
where
    U: fmt::Display,
    P: fmt::Display,
{
    use base64::prelude::BASE64_STANDARD;
    use base64::write::EncoderWriter;
    use std::io::Write;

    let mut buf = b"Basic ".to_vec();
    {
        let mut encoder = EncoderWriter::new(&mut buf, &BASE64_STANDARD);
        let _ = write!(encoder, "{}:", username);
        if let Some(password) = password {
            let _ = write!(encoder, "{}", password);
        }
    }
    let mut header = HeaderValue::from_bytes(&buf).expect("base64 is always a valid HeaderValue");
    header.set_sensitive(true);
    header
}

/// A string that should not appear in logs or debug output.
///
/// The value is zeroized when dropped.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    /// Expose the underlying value.
    pub fn revealed(&self) -> &str {
        &self.0
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret(value.to_owned())
    }
}

/// Trait for producing the `Authorization` header of a registry request.
pub trait Credential {
    /// The header value to attach, or `None` to send the request
    /// unauthenticated.
    fn authorization(&self) -> Option<HeaderValue>;
}

/// Static Basic authentication credentials.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    username: String,
    password: Option<Secret>,
}

impl BasicCredentials {
    /// Create new Basic credentials with an optional password.
    pub fn new<U, P>(username: U, password: Option<P>) -> Self
    where
        U: Into<String>,
        P: Into<Secret>,
    {
        BasicCredentials {
            username: username.into(),
            password: password.map(Into::into),
        }
    }
}

impl Credential for BasicCredentials {
    fn authorization(&self) -> Option<HeaderValue> {
        Some(basic_auth(
            &self.username,
            self.password.as_ref().map(Secret::revealed),
        ))
    }
}

/// A bearer token issued by an authorization realm.
#[derive(Debug, Clone)]
pub struct BearerToken(Secret);

impl BearerToken {
    /// Create a new bearer token.
    pub fn new<T: Into<Secret>>(token: T) -> Self {
        BearerToken(token.into())
    }
}

impl Credential for BearerToken {
    fn authorization(&self) -> Option<HeaderValue> {
        let mut header = HeaderValue::from_str(&format!("Bearer {}", self.0.revealed()))
            .expect("bearer token is a valid HTTP header value");
        header.set_sensitive(true);
        Some(header)
    }
}

/// One concrete credential, as held by a transport.
///
/// A transport starts from the caller-supplied variant and may swap in a
/// [`Credentials::Bearer`] after a token exchange.
#[derive(Debug, Clone, Default)]
pub enum Credentials {
    /// No authentication; requests carry no `Authorization` header.
    #[default]
    Anonymous,
    /// Basic authentication with static credentials.
    Basic(BasicCredentials),
    /// Bearer authentication with an issued token.
    Bearer(BearerToken),
}

impl Credentials {
    /// Basic credentials from a username and optional password.
    pub fn basic<U, P>(username: U, password: Option<P>) -> Self
    where
        U: Into<String>,
        P: Into<Secret>,
    {
        Credentials::Basic(BasicCredentials::new(username, password))
    }

    /// Bearer credentials from an issued token.
    pub fn bearer<T: Into<Secret>>(token: T) -> Self {
        Credentials::Bearer(BearerToken::new(token))
    }
}

impl Credential for Credentials {
    fn authorization(&self) -> Option<HeaderValue> {
        match self {
            Credentials::Anonymous => None,
            Credentials::Basic(basic) => basic.authorization(),
            Credentials::Bearer(bearer) => bearer.authorization(),
        }
    }
}
