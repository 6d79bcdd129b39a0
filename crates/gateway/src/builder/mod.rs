//! Method-specific outbound request builders.
//!
//! Every builder borrows one [`NormalizedRequest`] and derives the outbound method, uri, headers and body
//! from it without touching the request itself, so the same builder can be invoked any number of times.
//!
//! | builder                    | method   | query in uri | body                         |
//! |----------------------------|----------|--------------|------------------------------|
//! | [`GetRequestBuilder`]      | GET      | yes          | empty                        |
//! | [`DeleteRequestBuilder`]   | DELETE   | yes          | empty                        |
//! | [`PatchRequestBuilder`]    | PATCH    | no           | payload, re-encoded          |
//! | [`PostRequestBuilder`]     | POST     | no           | payload, re-encoded          |
//! | [`PutRequestBuilder`]      | PUT      | no           | payload, re-encoded          |
//! | [`DefaultRequestBuilder`]  | original | yes          | original bytes, streamed     |
//!
//! [`BuilderSelector`] maps the inbound method onto one of them.

mod default;
mod delete;
mod get;
mod patch;
mod post;
mod put;
mod selector;

pub use default::DefaultRequestBuilder;
pub use delete::DeleteRequestBuilder;
pub use get::GetRequestBuilder;
pub use patch::PatchRequestBuilder;
pub use post::PostRequestBuilder;
pub use put::PutRequestBuilder;
pub use selector::{BuilderFactory, BuilderSelector, BuilderSelectorBuilder};

use crate::body::OutboundBody;
use crate::encoding::PayloadEncoder;
use crate::error::{ConfigurationError, ForwardError};
use crate::outbound::OutboundRequest;
use crate::request::NormalizedRequest;
use http::{HeaderMap, Method, Uri, header};
use tracing::{error, trace};

/// The capabilities every outbound request builder provides.
pub trait OutboundRequestBuilder {
    /// The method of the upstream call.
    fn method(&self) -> Method;

    /// The absolute upstream uri.
    ///
    /// Fails with [`ConfigurationError::MissingTargetUrl`] when routing did not resolve a target.
    fn uri(&self) -> Result<Uri, ForwardError>;

    /// Headers sent upstream; calling it repeatedly yields the same set.
    fn headers(&self) -> HeaderMap;

    fn body(&self) -> Result<OutboundBody, ForwardError>;

    fn build(&self) -> Result<OutboundRequest, ForwardError> {
        let uri = self.uri()?;
        let body = self.body()?;
        Ok(OutboundRequest::new(self.method(), uri, self.headers(), body))
    }
}

/// Resolves the target url of `request`, optionally carrying its query parameters.
///
/// The target's own query is kept, propagated parameters are appended after it.
pub(crate) fn target_uri(request: &NormalizedRequest, propagate_query: bool) -> Result<Uri, ForwardError> {
    let Some(target) = request.target_url() else {
        error!(method = %request.original_method(), "no gateway request url, routing must run before outbound reconstruction");
        return Err(ConfigurationError::MissingTargetUrl.into());
    };

    let (Some(scheme), Some(authority)) = (target.scheme(), target.authority()) else {
        error!(url = %target, "gateway request url is not absolute");
        return Err(ConfigurationError::relative_target_url(target).into());
    };

    let propagated = if propagate_query { request.query_params().to_query_string()? } else { None };
    let own = target.query().filter(|query| !query.is_empty());

    let path = match target.path() {
        "" => "/",
        path => path,
    };
    let path_and_query = match (own, propagated) {
        (Some(own), Some(propagated)) => format!("{path}?{own}&{propagated}"),
        (Some(query), None) => format!("{path}?{query}"),
        (None, Some(query)) => format!("{path}?{query}"),
        (None, None) => path.to_string(),
    };

    Uri::builder()
        .scheme(scheme.as_str())
        .authority(authority.as_str())
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| ConfigurationError::invalid_uri(e).into())
}

/// Headers of `request` without the framing headers of the inbound body.
pub(crate) fn without_framing(request: &NormalizedRequest) -> HeaderMap {
    let mut headers = request.headers().clone();
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::TRANSFER_ENCODING);
    headers
}

/// Headers for a request that carries no body upstream.
pub(crate) fn bodyless_headers(request: &NormalizedRequest) -> HeaderMap {
    let mut headers = without_framing(request);
    headers.remove(header::CONTENT_TYPE);
    headers
}

/// Headers for a request whose body is the re-encoded payload.
pub(crate) fn payload_headers(request: &NormalizedRequest, encoder: &dyn PayloadEncoder) -> HeaderMap {
    if request.payload().is_none() {
        return bodyless_headers(request);
    }
    let mut headers = without_framing(request);
    headers.insert(header::CONTENT_TYPE, encoder.content_type());
    headers
}

/// Encodes the payload of `request` into a single chunk; an absent payload gives an empty body.
pub(crate) fn payload_body(request: &NormalizedRequest, encoder: &dyn PayloadEncoder) -> Result<OutboundBody, ForwardError> {
    let Some(payload) = request.payload() else {
        trace!(method = %request.original_method(), "no payload, sending empty body");
        return Ok(OutboundBody::empty());
    };
    let bytes = encoder.encode(payload)?;
    trace!(method = %request.original_method(), size = bytes.len(), "payload encoded");
    Ok(OutboundBody::once(bytes))
}
