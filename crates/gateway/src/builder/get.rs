use crate::body::OutboundBody;
use crate::builder::{OutboundRequestBuilder, bodyless_headers, target_uri};
use crate::error::ForwardError;
use crate::request::NormalizedRequest;
use http::{HeaderMap, Method, Uri};

/// Builds GET requests: like DELETE, the query travels in the uri and the body is never forwarded.
#[derive(Debug, Clone, Copy)]
pub struct GetRequestBuilder<'req> {
    request: &'req NormalizedRequest,
}

impl<'req> GetRequestBuilder<'req> {
    pub fn new(request: &'req NormalizedRequest) -> Self {
        Self { request }
    }
}

impl OutboundRequestBuilder for GetRequestBuilder<'_> {
    fn method(&self) -> Method {
        Method::GET
    }

    fn uri(&self) -> Result<Uri, ForwardError> {
        target_uri(self.request, true)
    }

    fn headers(&self) -> HeaderMap {
        bodyless_headers(self.request)
    }

    fn body(&self) -> Result<OutboundBody, ForwardError> {
        Ok(OutboundBody::empty())
    }
}
