use crate::body::OutboundBody;
use crate::builder::{OutboundRequestBuilder, bodyless_headers, target_uri};
use crate::error::ForwardError;
use crate::request::NormalizedRequest;
use http::{HeaderMap, Method, Uri};

/// Builds DELETE requests: the original query is propagated and no body is sent.
#[derive(Debug, Clone, Copy)]
pub struct DeleteRequestBuilder<'req> {
    request: &'req NormalizedRequest,
}

impl<'req> DeleteRequestBuilder<'req> {
    pub fn new(request: &'req NormalizedRequest) -> Self {
        Self { request }
    }
}

impl OutboundRequestBuilder for DeleteRequestBuilder<'_> {
    fn method(&self) -> Method {
        Method::DELETE
    }

    fn uri(&self) -> Result<Uri, ForwardError> {
        target_uri(self.request, true)
    }

    fn headers(&self) -> HeaderMap {
        bodyless_headers(self.request)
    }

    /// DELETE carries no payload, whatever the client sent.
    fn body(&self) -> Result<OutboundBody, ForwardError> {
        Ok(OutboundBody::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, header};
    use http_body::Body as HttpBody;
    use serde_json::json;

    #[test]
    fn delete_with_query() {
        let request = NormalizedRequest::builder(Method::DELETE)
            .target_url(Uri::from_static("https://upstream.example/api/orders/42"))
            .query("force", "true")
            .build();

        let outbound = DeleteRequestBuilder::new(&request).build().unwrap();

        assert_eq!(outbound.method(), Method::DELETE);
        assert_eq!(outbound.uri(), "https://upstream.example/api/orders/42?force=true");
        assert!(outbound.into_body().is_end_stream());
    }

    #[test]
    fn method_is_fixed_whatever_the_inbound_method() {
        let request = NormalizedRequest::builder(Method::POST)
            .target_url(Uri::from_static("https://upstream.example/api/orders/42"))
            .build();

        assert_eq!(DeleteRequestBuilder::new(&request).method(), Method::DELETE);
    }

    #[test]
    fn body_is_dropped() {
        let request = NormalizedRequest::builder(Method::DELETE)
            .target_url(Uri::from_static("https://upstream.example/api/orders/42"))
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(header::CONTENT_LENGTH, HeaderValue::from_static("16"))
            .header(header::AUTHORIZATION, HeaderValue::from_static("Bearer token"))
            .payload(json!({"reason": "dup"}))
            .raw_body(r#"{"reason":"dup"}"#)
            .build();
        let builder = DeleteRequestBuilder::new(&request);

        let body = builder.body().unwrap();
        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));

        let headers = builder.headers();
        assert!(headers.get(header::CONTENT_TYPE).is_none());
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer token");

        assert!(request.raw_body().can_consume());
    }
}
