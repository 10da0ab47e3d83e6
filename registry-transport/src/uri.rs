//! URL assembly and the scheme heuristic for registry hosts.

use http::uri::InvalidUri;
use http::Uri;

/// Development registries deployed under this host name are plain HTTP.
const DEVELOPMENT_HOST_PREFIX: &str = "registry-docker-registry";

/// The URL scheme to reach a registry host with.
///
/// Local registries (a `localhost:` port, a `.local`/`.localhost` alias, or
/// the in-cluster development host) speak plain HTTP; everything else is
/// HTTPS.
///
/// # Example
/// ```rust
/// use registry_transport::scheme;
///
/// assert_eq!(scheme("localhost:5000"), "http");
/// assert_eq!(scheme("registry.example.com"), "https");
/// ```
pub fn scheme(registry: &str) -> &'static str {
    if registry.starts_with("localhost:")
        || registry.starts_with(DEVELOPMENT_HOST_PREFIX)
        || is_local_alias(registry)
    {
        "http"
    } else {
        "https"
    }
}

/// Matches `*.local` and `*.localhost`, with an optional trailing port.
fn is_local_alias(registry: &str) -> bool {
    let host = match registry.rsplit_once(':') {
        Some((host, port))
            if (1..=5).contains(&port.len()) && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            host
        }
        _ => registry,
    };

    host.ends_with(".local") || host.ends_with(".localhost")
}

/// The v2 API root for a registry host.
pub(crate) fn registry_base(registry: &str) -> Result<Uri, InvalidUri> {
    format!("{}://{}/v2/", scheme(registry), registry).parse()
}

/// The token exchange URL for a realm, scope, and service.
///
/// The realm carries its own scheme and path; only the query is appended.
pub(crate) fn token_endpoint(realm: &str, scope: &str, service: &str) -> Result<Uri, InvalidUri> {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("scope", scope)
        .append_pair("service", service)
        .finish();

    format!("{realm}?{query}").parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_hosts_resolve_to_http() {
        assert_eq!(scheme("localhost:5000"), "http");
        assert_eq!(scheme("foo.local"), "http");
        assert_eq!(scheme("foo.local:5000"), "http");
        assert_eq!(scheme("foo.localhost"), "http");
        assert_eq!(scheme("foo.localhost:80"), "http");
        assert_eq!(scheme("registry-docker-registry.default.svc"), "http");
    }

    #[test]
    fn everything_else_resolves_to_https() {
        assert_eq!(scheme("registry.example.com"), "https");
        assert_eq!(scheme("gcr.io"), "https");
        // A bare "localhost" has no port marker and is not special-cased.
        assert_eq!(scheme("localhost"), "https");
        // Ports are at most five digits.
        assert_eq!(scheme("foo.local:123456"), "https");
        assert_eq!(scheme("mylocal"), "https");
    }

    #[test]
    fn registry_base_includes_the_v2_root() {
        let uri = registry_base("registry.example.com").unwrap();
        assert_eq!(uri.to_string(), "https://registry.example.com/v2/");

        let uri = registry_base("localhost:5000").unwrap();
        assert_eq!(uri.to_string(), "http://localhost:5000/v2/");
    }

    #[test]
    fn token_endpoint_encodes_the_query() {
        let uri = token_endpoint(
            "https://auth.example.com/token",
            "repository:library/ubuntu:pull",
            "registry.example.com",
        )
        .unwrap();

        assert_eq!(
            uri.to_string(),
            "https://auth.example.com/token?scope=repository%3Alibrary%2Fubuntu%3Apull&service=registry.example.com"
        );
    }
}
