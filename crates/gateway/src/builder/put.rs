use crate::body::OutboundBody;
use crate::builder::{OutboundRequestBuilder, payload_body, payload_headers, target_uri};
use crate::encoding::{JSON_ENCODER, PayloadEncoder};
use crate::error::ForwardError;
use crate::request::NormalizedRequest;
use http::{HeaderMap, Method, Uri};
use std::fmt;

/// Builds PUT requests with the same shape as PATCH: target url only, payload re-encoded.
#[derive(Clone, Copy)]
pub struct PutRequestBuilder<'req> {
    request: &'req NormalizedRequest,
    encoder: &'req dyn PayloadEncoder,
}

impl<'req> PutRequestBuilder<'req> {
    pub fn new(request: &'req NormalizedRequest) -> Self {
        Self::with_encoder(request, &JSON_ENCODER)
    }

    pub fn with_encoder(request: &'req NormalizedRequest, encoder: &'req dyn PayloadEncoder) -> Self {
        Self { request, encoder }
    }
}

impl fmt::Debug for PutRequestBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutRequestBuilder").field("request", self.request).finish_non_exhaustive()
    }
}

impl OutboundRequestBuilder for PutRequestBuilder<'_> {
    fn method(&self) -> Method {
        Method::PUT
    }

    fn uri(&self) -> Result<Uri, ForwardError> {
        target_uri(self.request, false)
    }

    fn headers(&self) -> HeaderMap {
        payload_headers(self.request, self.encoder)
    }

    fn body(&self) -> Result<OutboundBody, ForwardError> {
        payload_body(self.request, self.encoder)
    }
}
