use crate::body::OutboundBody;
use crate::builder::{OutboundRequestBuilder, payload_body, payload_headers, target_uri};
use crate::encoding::{JSON_ENCODER, PayloadEncoder};
use crate::error::ForwardError;
use crate::request::NormalizedRequest;
use http::{HeaderMap, Method, Uri};
use std::fmt;

/// Builds POST requests with the same shape as PATCH: target url only, payload re-encoded.
#[derive(Clone, Copy)]
pub struct PostRequestBuilder<'req> {
    request: &'req NormalizedRequest,
    encoder: &'req dyn PayloadEncoder,
}

impl<'req> PostRequestBuilder<'req> {
    pub fn new(request: &'req NormalizedRequest) -> Self {
        Self::with_encoder(request, &JSON_ENCODER)
    }

    pub fn with_encoder(request: &'req NormalizedRequest, encoder: &'req dyn PayloadEncoder) -> Self {
        Self { request, encoder }
    }
}

impl fmt::Debug for PostRequestBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostRequestBuilder").field("request", self.request).finish_non_exhaustive()
    }
}

impl OutboundRequestBuilder for PostRequestBuilder<'_> {
    fn method(&self) -> Method {
        Method::POST
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

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;
    use http_body_util::BodyExt;
    use serde_json::json;

    #[tokio::test]
    async fn post_creates_order() {
        let request = NormalizedRequest::builder(Method::POST)
            .target_url(Uri::from_static("https://upstream.example/api/orders"))
            .query("idempotency_key", "k-17")
            .payload(json!({"sku": "a-1", "qty": 2}))
            .build();

        let outbound = PostRequestBuilder::new(&request).build().unwrap();

        assert_eq!(outbound.method(), Method::POST);
        assert_eq!(outbound.uri(), "https://upstream.example/api/orders");
        assert_eq!(outbound.headers().get(header::CONTENT_TYPE).unwrap(), "application/json");
        let bytes = outbound.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), br#"{"sku":"a-1","qty":2}"#);
    }
}
