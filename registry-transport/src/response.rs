//! Collected registry responses.

use std::borrow::Cow;

use bytes::Bytes;
use http_body_util::BodyExt as _;
use hyperdriver::Body;

use crate::error::Error;

/// A registry response with its body fully collected.
///
/// The transport interprets bodies only for error diagnosis; everything else
/// is handed back to the caller unchanged.
#[derive(Debug)]
pub struct RegistryResponse {
    response: http::response::Parts,
    body: Bytes,
}

impl RegistryResponse {
    /// Collect the body of an HTTP response.
    pub(crate) async fn collect(response: http::Response<Body>) -> Result<Self, Error> {
        let (response, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|error| Error::Body(error.into()))?
            .to_bytes();

        Ok(RegistryResponse { response, body })
    }

    /// The response status code.
    pub fn status(&self) -> http::StatusCode {
        self.response.status
    }

    /// The response headers.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.response.headers
    }

    /// The collected response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Split into the response parts and the collected body.
    pub fn into_parts(self) -> (http::response::Parts, Bytes) {
        (self.response, self.body)
    }
}
