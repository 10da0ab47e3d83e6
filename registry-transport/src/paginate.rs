//! Pagination over registry responses linked by RFC 5988 `Link` headers.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use http::{HeaderMap, Uri};

use crate::error::Error;
use crate::request::Parameters;
use crate::response::RegistryResponse;
use crate::Transport;

/// Extract the `rel="next"` target from a response's `Link` header.
///
/// Only the first matching entry counts; other link parameters are
/// permitted and ignored. Returns `None` when the header is absent or names
/// no next page.
pub fn next_link(headers: &HeaderMap) -> Option<&str> {
    let link = headers.get(http::header::LINK)?.to_str().ok()?;

    for entry in link.split(',') {
        let entry = entry.trim();
        let Some(rest) = entry.strip_prefix('<') else {
            continue;
        };
        let Some((target, parameters)) = rest.split_once('>') else {
            continue;
        };

        if parameters
            .split(';')
            .any(|parameter| parameter.trim() == r#"rel="next""#)
        {
            return Some(target);
        }
    }

    None
}

enum State {
    /// Ready to request the next page, if there is one.
    Idle,
    /// A page request is in flight.
    Pending(BoxFuture<'static, Result<RegistryResponse, Error>>),
    /// The link chain ended, or an error terminated the stream.
    Complete,
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Idle => f.write_str("Idle"),
            State::Pending(_) => f.write_str("Pending"),
            State::Complete => f.write_str("Complete"),
        }
    }
}

/// A lazy stream of pages from a paginated registry endpoint.
///
/// Yields one [`RegistryResponse`] per page, requesting each page only as
/// the stream is polled. Every page independently runs the full
/// authentication and retry protocol. The stream is single-pass: once the
/// `Link` chain ends, or an error is yielded, it is exhausted.
#[derive(Debug)]
pub struct Paginated {
    transport: Transport,
    parameters: Parameters,
    next: Option<Uri>,
    state: State,
}

impl Paginated {
    pub(crate) fn new(transport: Transport, uri: Uri, parameters: Parameters) -> Self {
        Paginated {
            transport,
            parameters,
            next: Some(uri),
            state: State::Idle,
        }
    }
}

impl futures::Stream for Paginated {
    type Item = Result<RegistryResponse, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match &mut this.state {
                State::Idle => {
                    let Some(uri) = this.next.take() else {
                        this.state = State::Complete;
                        return Poll::Ready(None);
                    };

                    tracing::trace!(%uri, "requesting next page");
                    let transport = this.transport.clone();
                    let parameters = this.parameters.clone();
                    this.state = State::Pending(Box::pin(async move {
                        transport.execute(uri, &parameters).await
                    }));
                }
                State::Pending(future) => match future.as_mut().poll(cx) {
                    Poll::Ready(Ok(response)) => {
                        this.state = State::Idle;
                        match next_link(response.headers()) {
                            Some(link) => match link.parse::<Uri>() {
                                Ok(uri) => this.next = Some(uri),
                                Err(error) => {
                                    this.state = State::Complete;
                                    return Poll::Ready(Some(Err(error.into())));
                                }
                            },
                            None => this.next = None,
                        }
                        return Poll::Ready(Some(Ok(response)));
                    }
                    Poll::Ready(Err(error)) => {
                        this.state = State::Complete;
                        return Poll::Ready(Some(Err(error)));
                    }
                    Poll::Pending => return Poll::Pending,
                },
                State::Complete => return Poll::Ready(None),
            }
        }
    }
}
