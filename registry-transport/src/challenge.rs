//! Parsing of the `www-authenticate` challenge returned by the registry ping.

use crate::error::ProtocolError;

/// How a registry expects requests to authenticate, discovered once by the
/// opening ping and fixed for the life of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationMode {
    /// The registry answered the ping with 200; no authentication.
    Anonymous,
    /// The registry challenged with `Basic`; client credentials are sent
    /// directly.
    Basic,
    /// The registry challenged with `Bearer`; credentials are exchanged for
    /// short-lived tokens at the challenge realm.
    Bearer,
}

impl AuthenticationMode {
    /// Whether requests under this mode refresh tokens on a 401.
    pub(crate) fn refreshes(&self) -> bool {
        matches!(self, AuthenticationMode::Bearer)
    }
}

/// The authentication context established by the ping.
///
/// `realm` and `service` hold the placeholder `"none"` outside Bearer mode;
/// in Bearer mode the realm is guaranteed non-empty.
#[derive(Debug, Clone)]
pub(crate) struct Challenge {
    pub(crate) mode: AuthenticationMode,
    pub(crate) realm: String,
    pub(crate) service: String,
}

impl Challenge {
    /// The context for a registry that answered the ping with 200.
    pub(crate) fn anonymous() -> Self {
        Challenge {
            mode: AuthenticationMode::Anonymous,
            realm: "none".to_owned(),
            service: "none".to_owned(),
        }
    }

    /// Parse a `www-authenticate` header value.
    ///
    /// Scheme matching is case-insensitive (RFC 7235 §2.1), so the scheme
    /// token is normalized to have exactly its first letter capitalized
    /// before comparison. A Bearer challenge must name a realm; its service
    /// defaults to the registry host.
    pub(crate) fn parse(header: &str, registry: &str) -> Result<Self, ProtocolError> {
        let Some((scheme, remainder)) = header.split_once(' ') else {
            return Err(ProtocolError::MalformedChallenge(header.to_owned()));
        };

        match normalize_scheme(scheme).as_str() {
            "Basic" => Ok(Challenge {
                mode: AuthenticationMode::Basic,
                realm: "none".to_owned(),
                service: "none".to_owned(),
            }),
            "Bearer" => {
                let mut realm = None;
                let mut service = None;

                for parameter in remainder.split(',') {
                    let parameter = parameter.trim();
                    if let Some(value) = parameter.strip_prefix("realm=") {
                        realm = Some(value.trim_matches('"').to_owned());
                    } else if let Some(value) = parameter.strip_prefix("service=") {
                        service = Some(value.trim_matches('"').to_owned());
                    }
                }

                let realm = realm
                    .filter(|realm| !realm.is_empty())
                    .ok_or_else(|| ProtocolError::MissingRealm(header.to_owned()))?;

                Ok(Challenge {
                    mode: AuthenticationMode::Bearer,
                    realm,
                    service: service.unwrap_or_else(|| registry.to_owned()),
                })
            }
            other => Err(ProtocolError::UnsupportedChallengeScheme(other.to_owned())),
        }
    }
}

fn normalize_scheme(scheme: &str) -> String {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
