use crate::body::OutboundBody;
use crate::builder::{OutboundRequestBuilder, payload_body, payload_headers, target_uri};
use crate::encoding::{JSON_ENCODER, PayloadEncoder};
use crate::error::ForwardError;
use crate::request::NormalizedRequest;
use http::{HeaderMap, Method, Uri};
use std::fmt;

/// Builds PATCH requests.
///
/// The uri is the target url alone: query parameters of the inbound request are not propagated. The body is
/// the decoded payload encoded again, sent as a single chunk. An absent payload is sent as an empty body
/// while an explicit json `null` is sent as `null`.
#[derive(Clone, Copy)]
pub struct PatchRequestBuilder<'req> {
    request: &'req NormalizedRequest,
    encoder: &'req dyn PayloadEncoder,
}

impl<'req> PatchRequestBuilder<'req> {
    pub fn new(request: &'req NormalizedRequest) -> Self {
        Self::with_encoder(request, &JSON_ENCODER)
    }

    pub fn with_encoder(request: &'req NormalizedRequest, encoder: &'req dyn PayloadEncoder) -> Self {
        Self { request, encoder }
    }
}

impl fmt::Debug for PatchRequestBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchRequestBuilder").field("request", self.request).finish_non_exhaustive()
    }
}

impl OutboundRequestBuilder for PatchRequestBuilder<'_> {
    fn method(&self) -> Method {
        Method::PATCH
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
