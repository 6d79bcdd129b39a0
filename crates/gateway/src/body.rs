//! Byte bodies on both sides of the gateway.
//!
//! - [`RawBody`] holds the inbound bytes exactly as the client sent them. Pass-through builders take them
//!   from the request without touching the payload.
//! - [`OutboundBody`] is what the transport layer pulls from when sending upstream. It is either empty,
//!   a single materialized chunk, or a lazy stream that only reads from its source when polled.
//!
//! Dropping an [`OutboundBody`] before its end releases the wrapped stream, so a cancelled exchange never
//! keeps the inbound connection's body alive.

use crate::error::BodyError;
use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body::{Frame, SizeHint};
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;
use pin_project_lite::pin_project;
use std::error::Error;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use tracing::{debug, trace};

type BoxBody = UnsyncBoxBody<Bytes, BodyError>;

/// The inbound body as received from the client.
///
/// A `full` body is restartable: every [`RawBody::take`] hands out the same bytes. A `stream` body can be
/// taken exactly once; later takes fail with [`BodyError::Consumed`].
#[derive(Clone)]
pub struct RawBody {
    inner: RawKind,
}

#[derive(Clone)]
enum RawKind {
    Empty,
    Full(Bytes),
    Stream(Arc<Mutex<Option<BoxBody>>>),
}

impl RawBody {
    pub fn empty() -> Self {
        Self { inner: RawKind::Empty }
    }

    pub fn full(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() { Self::empty() } else { Self { inner: RawKind::Full(bytes) } }
    }

    pub fn stream<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        let body = body
            .map_err(|e| {
                let cause: Box<dyn Error + Send + Sync> = e.into();
                BodyError::stream(cause)
            })
            .boxed_unsync();
        Self { inner: RawKind::Stream(Arc::new(Mutex::new(Some(body)))) }
    }

    /// Returns true if the body may still be taken.
    pub fn can_consume(&self) -> bool {
        match &self.inner {
            RawKind::Empty | RawKind::Full(_) => true,
            RawKind::Stream(cell) => lock(cell).is_some(),
        }
    }

    /// Hands out the original bytes as a lazy outbound body.
    pub fn take(&self) -> Result<OutboundBody, BodyError> {
        match &self.inner {
            RawKind::Empty => Ok(OutboundBody::empty()),
            RawKind::Full(bytes) => Ok(OutboundBody::once(bytes.clone())),
            RawKind::Stream(cell) => {
                let body = lock(cell).take().ok_or(BodyError::Consumed)?;
                Ok(OutboundBody::stream(PassthroughBody::new(body)))
            }
        }
    }
}

/// A poisoned slot is still consistent: it only ever goes from `Some` to `None`.
fn lock(cell: &Mutex<Option<BoxBody>>) -> MutexGuard<'_, Option<BoxBody>> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for RawBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for RawBody {
    fn from(bytes: Bytes) -> Self {
        Self::full(bytes)
    }
}

impl From<&'static str> for RawBody {
    fn from(value: &'static str) -> Self {
        Self::full(Bytes::from_static(value.as_bytes()))
    }
}

impl fmt::Debug for RawBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            RawKind::Empty => f.write_str("RawBody::Empty"),
            RawKind::Full(bytes) => f.debug_tuple("RawBody::Full").field(&bytes.len()).finish(),
            RawKind::Stream(_) => f.write_str("RawBody::Stream"),
        }
    }
}

pub struct OutboundBody {
    inner: Kind,
}

enum Kind {
    Once(Option<Bytes>),
    Stream(BoxBody),
}

impl OutboundBody {
    pub fn empty() -> Self {
        Self { inner: Kind::Once(None) }
    }

    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { inner: Kind::Once(Some(bytes)) } }
    }

    pub fn stream<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes, Error = BodyError> + Send + 'static,
    {
        Self { inner: Kind::Stream(UnsyncBoxBody::new(body)) }
    }
}

impl From<Bytes> for OutboundBody {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<()> for OutboundBody {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

impl fmt::Debug for OutboundBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Kind::Once(None) => f.write_str("OutboundBody::Empty"),
            Kind::Once(Some(bytes)) => f.debug_tuple("OutboundBody::Once").field(&bytes.len()).finish(),
            Kind::Stream(_) => f.write_str("OutboundBody::Stream"),
        }
    }
}

impl HttpBody for OutboundBody {
    type Data = Bytes;
    type Error = BodyError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().inner {
            Kind::Once(option_bytes) => Poll::Ready(option_bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Stream(box_body) => Pin::new(box_body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.inner {
            Kind::Once(option_bytes) => option_bytes.is_none(),
            Kind::Stream(box_body) => box_body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            Kind::Once(None) => SizeHint::with_exact(0),
            Kind::Once(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Stream(box_body) => box_body.size_hint(),
        }
    }
}

pin_project! {
    /// Forwards the inbound stream frame by frame and reports streams abandoned before their end.
    struct PassthroughBody<B> {
        #[pin]
        inner: B,
        forwarded: u64,
        finished: bool,
    }

    impl<B> PinnedDrop for PassthroughBody<B> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            if !*this.finished {
                debug!(forwarded = *this.forwarded, "passthrough body dropped before end of stream");
            }
        }
    }
}

impl<B> PassthroughBody<B> {
    fn new(inner: B) -> Self {
        Self { inner, forwarded: 0, finished: false }
    }
}

impl<B> HttpBody for PassthroughBody<B>
where
    B: HttpBody<Data = Bytes, Error = BodyError>,
{
    type Data = Bytes;
    type Error = BodyError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        match ready!(this.inner.poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    *this.forwarded += data.len() as u64;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(e)) => {
                *this.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            None => {
                *this.finished = true;
                trace!(forwarded = *this.forwarded, "passthrough body finished");
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
