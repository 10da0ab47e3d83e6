//! HTTP transport for the container registry v2 protocol.
//!
//! Registry API endpoints expect `Bearer` authentication, with tokens issued
//! by an authorization realm discovered through an opening ping. The
//! [`Transport`] performs that handshake once, exchanges the client
//! credentials for a token when the registry asks for one, and transparently
//! refreshes and retries a request exactly once when a token expires
//! mid-session. Registry error bodies surface as structured [`Diagnostic`]s,
//! and `Link`-paginated endpoints can be walked as a stream.
//!
//! ```no_run
//! use registry_transport::{Action, Credentials, Repository, Transport};
//!
//! # async fn example() -> Result<(), registry_transport::Error> {
//! let repository = Repository::new("registry.example.com", "library/ubuntu");
//! let transport = Transport::connect(repository, Credentials::Anonymous, Action::Pull).await?;
//!
//! let uri: http::Uri = "https://registry.example.com/v2/library/ubuntu/tags/list".parse()?;
//! let tags = transport.request(uri).send().await?;
//! println!("{}", tags.text());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use http::{HeaderValue, Method, StatusCode, Uri};
use hyperdriver::client::SharedClientService;
use hyperdriver::service::SharedService;
use hyperdriver::Body;
use tower::ServiceExt as _;

mod authentication;
mod challenge;
pub mod diagnostics;
mod error;
pub mod mediatypes;
mod paginate;
mod request;
mod resource;
mod response;
mod uri;

pub use self::authentication::{
    basic_auth, BasicCredentials, BearerToken, Credential, Credentials, Secret,
};
pub use self::challenge::AuthenticationMode;
pub use self::diagnostics::{Diagnostic, DiagnosticError};
pub use self::error::{Error, InvalidAction, ProtocolError};
pub use self::paginate::{next_link, Paginated};
pub use self::request::RequestBuilder;
pub use self::resource::{Action, Catalog, Repository, Resource};
pub use self::response::RegistryResponse;
pub use self::uri::scheme;

use self::challenge::Challenge;
use self::request::Parameters;

/// The `user-agent` sent with every registry request.
pub const USER_AGENT: &str = concat!("registry-transport/", env!("CARGO_PKG_VERSION"));

/// Token exchange response body; realms use either field name.
#[derive(Debug, serde::Deserialize)]
struct TokenExchange {
    token: Option<String>,
    access_token: Option<String>,
}

/// HTTP transport handling automatic v2 registry authentication.
///
/// Construction pings the registry to discover its authentication mode and,
/// for Bearer registries, eagerly exchanges the client credentials for a
/// token scoped to the resource and action. Bearer tokens are short-lived;
/// when a request is rejected with `401 Unauthorized`, the transport
/// refreshes the token and reissues the request exactly once.
///
/// Cloning is cheap; clones share the discovered authentication context and
/// the current credentials.
#[derive(Debug, Clone)]
pub struct Transport {
    inner: SharedClientService<Body, Body>,
    resource: Arc<dyn Resource>,
    action: Action,
    client_credentials: Credentials,
    credentials: Arc<ArcSwap<Credentials>>,
    challenge: Challenge,
}

impl Transport {
    /// Connect to the registry a resource lives on.
    ///
    /// `credentials` are the client credentials used for authentication
    /// challenge exchanges; for an unauthenticated registry they are never
    /// sent.
    pub async fn connect<R>(
        resource: R,
        credentials: Credentials,
        action: Action,
    ) -> Result<Self, Error>
    where
        R: Resource + 'static,
    {
        let service = hyperdriver::Client::build_tcp_http()
            .with_default_tls()
            .build_service();

        Self::handshake(service, Arc::new(resource), credentials, action).await
    }

    /// Connect through a caller-supplied HTTP service instead of the default
    /// client.
    pub async fn connect_with_inner_service<R, S>(
        resource: R,
        credentials: Credentials,
        action: Action,
        service: S,
    ) -> Result<Self, Error>
    where
        R: Resource + 'static,
        S: tower::Service<
                http::Request<Body>,
                Response = http::Response<Body>,
                Error = hyperdriver::client::Error,
            > + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let service = tower::ServiceBuilder::new()
            .layer(SharedService::layer())
            .service(service);

        Self::handshake(service, Arc::new(resource), credentials, action).await
    }

    async fn handshake(
        inner: SharedClientService<Body, Body>,
        resource: Arc<dyn Resource>,
        credentials: Credentials,
        action: Action,
    ) -> Result<Self, Error> {
        let challenge = Self::ping(&inner, resource.registry()).await?;
        tracing::debug!(mode = ?challenge.mode, "discovered registry authentication mode");

        // Outside Basic mode the initial credentials are a placeholder: a
        // Bearer exchange installs the real ones below, and Anonymous mode
        // sends none at all.
        let current = match challenge.mode {
            AuthenticationMode::Basic => credentials.clone(),
            _ => Credentials::Anonymous,
        };

        let transport = Transport {
            inner,
            resource,
            action,
            client_credentials: credentials,
            credentials: Arc::new(ArcSwap::from_pointee(current)),
            challenge,
        };

        if transport.challenge.mode == AuthenticationMode::Bearer {
            transport.refresh().await?;
        }

        Ok(transport)
    }

    /// The authentication mode discovered by the opening ping.
    pub fn mode(&self) -> AuthenticationMode {
        self.challenge.mode
    }

    /// The action this transport was scoped for.
    pub fn action(&self) -> Action {
        self.action
    }

    /// Begin building a request against a registry URL.
    pub fn request(&self, uri: Uri) -> RequestBuilder {
        RequestBuilder::new(self.clone(), uri)
    }

    /// Ping the v2 registry to establish the realm and service for token
    /// exchanges. Only called during construction.
    async fn ping(inner: &SharedClientService<Body, Body>, registry: &str) -> Result<Challenge, Error> {
        let uri = uri::registry_base(registry)?;
        tracing::trace!(%uri, "pinging the registry");

        let request = http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .header(http::header::USER_AGENT, USER_AGENT)
            .body(Body::empty())?;

        let response = inner.clone().oneshot(request).await?;
        let response = RegistryResponse::collect(response).await?;

        match response.status() {
            StatusCode::OK => Ok(Challenge::anonymous()),
            StatusCode::UNAUTHORIZED => {
                let header = response
                    .headers()
                    .get(http::header::WWW_AUTHENTICATE)
                    .and_then(|value| value.to_str().ok())
                    .ok_or(ProtocolError::MissingChallenge)?;

                Ok(Challenge::parse(header, registry)?)
            }
            status => Err(ProtocolError::UnexpectedPingStatus {
                status,
                body: response.text().into_owned(),
            }
            .into()),
        }
    }

    /// Exchange the client credentials for a fresh bearer token at the
    /// challenge realm, and install it as the current credentials.
    ///
    /// Called eagerly at construction and again when a request comes back
    /// `401 Unauthorized`. The exchange always re-authenticates from the
    /// original client credentials, never from the current bearer token.
    async fn refresh(&self) -> Result<(), Error> {
        let scope = self.resource.scope(self.action);
        let uri = uri::token_endpoint(&self.challenge.realm, &scope, &self.challenge.service)?;
        tracing::debug!(%uri, "refreshing bearer token");

        let mut builder = http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .header(http::header::USER_AGENT, USER_AGENT);

        if let Some(authorization) = self.client_credentials.authorization() {
            builder = builder.header(http::header::AUTHORIZATION, authorization);
        }

        let request = builder.body(Body::empty())?;
        let response = self.inner.clone().oneshot(request).await?;
        let response = RegistryResponse::collect(response).await?;

        if response.status() != StatusCode::OK {
            return Err(Error::TokenRefresh {
                status: response.status(),
                body: response.text().into_owned(),
            });
        }

        let exchange: TokenExchange = response
            .json()
            .map_err(|_| ProtocolError::MalformedTokenResponse(response.text().into_owned()))?;
        let Some(token) = exchange.token.or(exchange.access_token) else {
            return Err(
                ProtocolError::MalformedTokenResponse(response.text().into_owned()).into(),
            );
        };

        self.credentials.store(Arc::new(Credentials::bearer(token)));
        Ok(())
    }

    /// Issue a request, refreshing credentials and reissuing it at most once
    /// on an expired bearer token. The second outcome is final.
    pub(crate) async fn execute(
        &self,
        uri: Uri,
        parameters: &Parameters,
    ) -> Result<RegistryResponse, Error> {
        let mut response = self.issue(&uri, parameters).await?;

        if self.challenge.mode.refreshes() && response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!(%uri, "unauthorized response, refreshing credentials and retrying");
            self.refresh().await?;
            response = self.issue(&uri, parameters).await?;
        }

        if !parameters.accepted.contains(&response.status()) {
            return Err(DiagnosticError::from_response(response).into());
        }

        Ok(response)
    }

    /// One attempt: build the request with the current credentials and issue
    /// it.
    async fn issue(&self, uri: &Uri, parameters: &Parameters) -> Result<RegistryResponse, Error> {
        let method = parameters.method();

        let mut builder = http::Request::builder()
            .method(method.clone())
            .uri(uri.clone())
            .header(http::header::USER_AGENT, USER_AGENT);

        // A refresh may have swapped the credentials since the last attempt,
        // so they are re-read here rather than captured once per call.
        if let Some(authorization) = self.credentials.load().authorization() {
            builder = builder.header(http::header::AUTHORIZATION, authorization);
        }

        if parameters.body.is_some() {
            let content_type = parameters
                .content_type
                .clone()
                .unwrap_or_else(|| HeaderValue::from_static("application/json"));
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }

        if let Some(accept) = &parameters.accept {
            builder = builder.header(http::header::ACCEPT, accept.as_str());
        }

        // POST and PUT require a content-length even when no body is sent.
        if (method == Method::POST || method == Method::PUT) && parameters.body.is_none() {
            builder = builder.header(http::header::CONTENT_LENGTH, "0");
        }

        let body = parameters
            .body
            .clone()
            .map(Body::from)
            .unwrap_or_else(Body::empty);
        let request = builder.body(body)?;

        let response = self.inner.clone().oneshot(request).await?;
        RegistryResponse::collect(response).await
    }
}

pub mod mock {
    //! A scripted registry for exercising the transport without a network.
    //!
    //! Responses are queued per request path and served in order, so a
    //! single path can be scripted to reject once and then succeed. Every
    //! request is recorded for inspection.

    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use hyperdriver::Body;

    /// One scripted response.
    #[derive(Debug, Clone)]
    pub struct MockResponse {
        status: StatusCode,
        headers: HeaderMap,
        body: Vec<u8>,
    }

    impl MockResponse {
        /// A response with the given status, no headers, and an empty body.
        pub fn new(status: StatusCode) -> Self {
            MockResponse {
                status,
                headers: HeaderMap::new(),
                body: Vec::new(),
            }
        }

        /// Add a header to the scripted response.
        pub fn header(mut self, name: &'static str, value: &str) -> Self {
            self.headers.append(
                http::HeaderName::from_static(name),
                HeaderValue::from_str(value).expect("scripted header value is valid"),
            );
            self
        }

        /// Set the scripted response body.
        pub fn body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
            self.body = body.into();
            self
        }
    }

    /// A request as seen by the mock registry.
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        /// The request method.
        pub method: http::Method,
        /// The full request URI.
        pub uri: http::Uri,
        /// The request headers.
        pub headers: HeaderMap,
    }

    /// A `tower::Service` standing in for a registry and its token realm.
    ///
    /// Clones share the same script and request log.
    #[derive(Debug, Default, Clone)]
    pub struct MockRegistry {
        responses: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    impl MockRegistry {
        /// Create an empty mock registry.
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response for a request path. Responses queued for the
        /// same path are served in order.
        pub fn enqueue(&self, path: &str, response: MockResponse) {
            self.responses
                .lock()
                .expect("mock registry lock")
                .entry(path.to_owned())
                .or_default()
                .push_back(response);
        }

        /// Every request seen so far, in order.
        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().expect("mock registry lock").clone()
        }

        /// How many requests have targeted a path.
        pub fn requests_to(&self, path: &str) -> usize {
            self.requests
                .lock()
                .expect("mock registry lock")
                .iter()
                .filter(|request| request.uri.path() == path)
                .count()
        }
    }

    impl tower::Service<http::Request<Body>> for MockRegistry {
        type Response = http::Response<Body>;
        type Error = hyperdriver::client::Error;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(
            &mut self,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<Body>) -> Self::Future {
            self.requests
                .lock()
                .expect("mock registry lock")
                .push(RecordedRequest {
                    method: req.method().clone(),
                    uri: req.uri().clone(),
                    headers: req.headers().clone(),
                });

            let path = req.uri().path().to_owned();
            let response = self
                .responses
                .lock()
                .expect("mock registry lock")
                .get_mut(&path)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| panic!("no scripted response for path: {path}"));

            let mut builder = http::Response::builder()
                .status(response.status)
                .version(http::Version::HTTP_11);
            for (key, value) in response.headers.iter() {
                builder = builder.header(key, value);
            }
            let response = builder
                .body(Body::from(Bytes::from(response.body)))
                .expect("scripted response is valid");

            std::future::ready(Ok(response))
        }
    }
}
