use crate::body::OutboundBody;
use http::{HeaderMap, Method, Request, Uri};

/// The request handed to the transport layer, which owns it from then on.
#[derive(Debug)]
pub struct OutboundRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: OutboundBody,
}

impl OutboundRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: OutboundBody) -> Self {
        Self { method, uri, headers, body }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute uri of the upstream call.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body_mut(&mut self) -> &mut OutboundBody {
        &mut self.body
    }

    pub fn into_body(self) -> OutboundBody {
        self.body
    }

    pub fn into_parts(self) -> (Method, Uri, HeaderMap, OutboundBody) {
        (self.method, self.uri, self.headers, self.body)
    }
}

impl From<OutboundRequest> for Request<OutboundBody> {
    fn from(outbound: OutboundRequest) -> Self {
        let (method, uri, headers, body) = outbound.into_parts();
        let mut request = Request::new(body);
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.headers_mut() = headers;
        request
    }
}
