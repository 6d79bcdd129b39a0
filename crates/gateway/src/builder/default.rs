use crate::body::OutboundBody;
use crate::builder::{OutboundRequestBuilder, target_uri};
use crate::error::ForwardError;
use crate::request::NormalizedRequest;
use http::{HeaderMap, Method, Uri};

/// Pass-through builder for every method without a dedicated builder.
///
/// Keeps the original method, propagates the query, copies the headers as they are and streams the original
/// body bytes without decoding them. A streamed body can only be forwarded once; building again fails with
/// [`BodyError::Consumed`](crate::BodyError::Consumed).
#[derive(Debug, Clone, Copy)]
pub struct DefaultRequestBuilder<'req> {
    request: &'req NormalizedRequest,
}

impl<'req> DefaultRequestBuilder<'req> {
    pub fn new(request: &'req NormalizedRequest) -> Self {
        Self { request }
    }
}

impl OutboundRequestBuilder for DefaultRequestBuilder<'_> {
    fn method(&self) -> Method {
        self.request.original_method().clone()
    }

    fn uri(&self) -> Result<Uri, ForwardError> {
        target_uri(self.request, true)
    }

    fn headers(&self) -> HeaderMap {
        self.request.headers().clone()
    }

    fn body(&self) -> Result<OutboundBody, ForwardError> {
        Ok(self.request.raw_body().take()?)
    }
}
