//! Request construction for registry calls.

use bytes::Bytes;
use http::{HeaderValue, Method, StatusCode, Uri};

use crate::error::Error;
use crate::paginate::Paginated;
use crate::response::RegistryResponse;
use crate::Transport;

/// Everything about a request except its target URL, so that pagination can
/// replay the same call against successive page URLs.
#[derive(Debug, Clone)]
pub(crate) struct Parameters {
    pub(crate) accepted: Vec<StatusCode>,
    pub(crate) method: Option<Method>,
    pub(crate) body: Option<Bytes>,
    pub(crate) content_type: Option<HeaderValue>,
    pub(crate) accept: Option<String>,
}

impl Parameters {
    /// The effective method: GET without a body, PUT with one, unless the
    /// caller chose otherwise.
    pub(crate) fn method(&self) -> Method {
        match &self.method {
            Some(method) => method.clone(),
            None if self.body.is_some() => Method::PUT,
            None => Method::GET,
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            accepted: vec![StatusCode::OK],
            method: None,
            body: None,
            content_type: None,
            accept: None,
        }
    }
}

/// A builder for one authenticated registry request.
///
/// Created by [`Transport::request`]; dispatched with [`send`][Self::send]
/// for a single call or [`paginate`][Self::paginate] to follow `Link`
/// headers across pages.
#[derive(Debug)]
pub struct RequestBuilder {
    transport: Transport,
    uri: Uri,
    parameters: Parameters,
}

impl RequestBuilder {
    pub(crate) fn new(transport: Transport, uri: Uri) -> Self {
        RequestBuilder {
            transport,
            uri,
            parameters: Parameters::default(),
        }
    }

    /// The status codes treated as success. Defaults to `200 OK` alone.
    ///
    /// Anything else fails the call with the diagnostics parsed from the
    /// response body.
    pub fn accepted_codes<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = StatusCode>,
    {
        self.parameters.accepted = codes.into_iter().collect();
        self
    }

    /// Override the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.parameters.method = Some(method);
        self
    }

    /// Attach a request body. Without an explicit method this turns the
    /// request into a PUT.
    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.parameters.body = Some(body.into());
        self
    }

    /// The `content-type` for the body. Ignored when no body is attached;
    /// defaults to `application/json` when one is.
    pub fn content_type(mut self, content_type: HeaderValue) -> Self {
        self.parameters.content_type = Some(content_type);
        self
    }

    /// The response media types to advertise in the `Accept` header.
    ///
    /// No `Accept` header is sent unless this is called.
    pub fn accepted_mimes<I, M>(mut self, mimes: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: AsRef<str>,
    {
        let joined = mimes
            .into_iter()
            .map(|mime| mime.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(",");
        self.parameters.accept = Some(joined);
        self
    }

    /// Issue the request, refreshing credentials and retrying once on an
    /// expired bearer token.
    pub async fn send(self) -> Result<RegistryResponse, Error> {
        self.transport.execute(self.uri, &self.parameters).await
    }

    /// Issue the request and follow `rel="next"` links across pages.
    ///
    /// Each page replays the accepted codes, method, and body of this
    /// builder with the full authentication protocol. Paginated endpoints
    /// negotiate no media types, so any `Accept` set on this builder is
    /// dropped.
    pub fn paginate(self) -> Paginated {
        let parameters = Parameters {
            accept: None,
            ..self.parameters
        };
        Paginated::new(self.transport, self.uri, parameters)
    }
}
