//! Outbound request reconstruction for the micro http gateway
//!
//! Once routing has picked an upstream and the inbound body has been decoded, the gateway has to build the
//! request it actually sends upstream. The shape of that request depends on the method: DELETE forwards
//! the query but never a body, PATCH re-encodes the decoded payload and drops the query, methods without
//! special handling are passed through untouched. This crate does exactly that and nothing else; routing,
//! transport and connection handling live elsewhere.
//!
//! # Data flow
//!
//! ```text
//! ExchangeContext (transport) ──▶ NormalizedRequest ──▶ BuilderSelector ──▶ OutboundRequestBuilder
//!                                                                                   │
//!                                          transport layer ◀── OutboundRequest ◀────┘
//! ```
//!
//! - [`NormalizedRequest`]: immutable snapshot of the inbound request plus the routing-resolved target url
//! - [`BuilderSelector`]: picks one builder per method, falling back to [`DefaultRequestBuilder`]
//! - [`OutboundRequestBuilder`]: method, uri, headers and body of the upstream call
//! - [`OutboundBody`]: lazy body implementing [`http_body::Body`]
//! - [`JsonEncoder`]: re-encodes decoded payloads
//!
//! # Example
//!
//! ```
//! use http::{Method, Uri};
//! use micro_gateway::{BuilderSelector, NormalizedRequest};
//!
//! let selector = BuilderSelector::default();
//! let request = NormalizedRequest::builder(Method::DELETE)
//!     .target_url(Uri::from_static("https://upstream.example/api/orders/42"))
//!     .query("force", "true")
//!     .build();
//!
//! let outbound = selector.build_outbound(&request).unwrap();
//! assert_eq!(outbound.method(), Method::DELETE);
//! assert_eq!(outbound.uri(), "https://upstream.example/api/orders/42?force=true");
//! ```

mod body;
mod encoding;
mod error;
mod outbound;
mod request;

pub mod builder;

#[cfg(test)]
mod test_utils;

pub use body::{OutboundBody, RawBody};
pub use builder::{BuilderSelector, DefaultRequestBuilder, OutboundRequestBuilder};
pub use encoding::{JsonEncoder, PayloadEncoder};
pub use error::{BodyError, ConfigurationError, EncodingError, ForwardError};
pub use outbound::OutboundRequest;
pub use request::{ExchangeContext, GatewayRequestUrl, NormalizedRequest, NormalizedRequestBuilder, QueryParams};
