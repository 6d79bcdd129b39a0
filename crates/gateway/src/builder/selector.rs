//! Dispatch from the inbound method to the builder that shapes the outbound request.
//!
//! The table is compiled in: GET, DELETE, PATCH, POST and PUT have dedicated builders, everything else goes
//! through [`DefaultRequestBuilder`]. An unknown method is not an error; deciding which methods a route
//! accepts is the routing layer's job.
//!
//! Lookup is case-insensitive: an inbound `patch` token selects the PATCH builder, while the pass-through
//! builder still forwards the method exactly as received.

use crate::builder::{
    DefaultRequestBuilder, DeleteRequestBuilder, GetRequestBuilder, OutboundRequestBuilder, PatchRequestBuilder,
    PostRequestBuilder, PutRequestBuilder,
};
use crate::encoding::{JsonEncoder, PayloadEncoder};
use crate::error::ForwardError;
use crate::outbound::OutboundRequest;
use crate::request::NormalizedRequest;
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Creates the builder for one request.
pub type BuilderFactory =
    for<'a> fn(&'a NormalizedRequest, &'a dyn PayloadEncoder) -> Box<dyn OutboundRequestBuilder + 'a>;

pub struct BuilderSelector {
    routes: HashMap<Method, BuilderFactory>,
    encoder: Arc<dyn PayloadEncoder>,
}

impl BuilderSelector {
    pub fn builder() -> BuilderSelectorBuilder {
        BuilderSelectorBuilder::new()
    }

    /// Picks the builder for `request`, bound to it.
    pub fn select<'a>(&'a self, request: &'a NormalizedRequest) -> Box<dyn OutboundRequestBuilder + 'a> {
        match self.route(request.original_method()) {
            Some(factory) => factory(request, self.encoder.as_ref()),
            None => Box::new(DefaultRequestBuilder::new(request)),
        }
    }

    /// Selects the builder for `request` and builds the outbound request with it.
    pub fn build_outbound(&self, request: &NormalizedRequest) -> Result<OutboundRequest, ForwardError> {
        let builder = self.select(request);
        let method = request.original_method();
        debug!(method = %method, outbound_method = %builder.method(), "building outbound request");

        builder.build().inspect_err(|e| {
            if !e.is_fatal() {
                warn!(method = %method, cause = %e, "failed to build outbound request");
            }
        })
    }

    /// Returns true if `method` has a dedicated builder.
    pub fn is_routed(&self, method: &Method) -> bool {
        self.route(method).is_some()
    }

    fn route(&self, method: &Method) -> Option<BuilderFactory> {
        if let Some(factory) = self.routes.get(method) {
            return Some(*factory);
        }

        let name = method.as_str();
        if name.bytes().all(|b| !b.is_ascii_lowercase()) {
            return None;
        }
        let upper = Method::from_bytes(name.to_ascii_uppercase().as_bytes()).ok()?;
        self.routes.get(&upper).copied()
    }
}

impl Default for BuilderSelector {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for BuilderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods = self.routes.keys().map(Method::as_str).collect::<Vec<_>>();
        methods.sort_unstable();
        f.debug_struct("BuilderSelector").field("routes", &methods).finish_non_exhaustive()
    }
}

pub struct BuilderSelectorBuilder {
    routes: HashMap<Method, BuilderFactory>,
    encoder: Arc<dyn PayloadEncoder>,
}

impl BuilderSelectorBuilder {
    fn new() -> Self {
        let mut routes: HashMap<Method, BuilderFactory> = HashMap::with_capacity(8);
        routes.insert(Method::GET, get);
        routes.insert(Method::DELETE, delete);
        routes.insert(Method::PATCH, patch);
        routes.insert(Method::POST, post);
        routes.insert(Method::PUT, put);
        Self { routes, encoder: Arc::new(JsonEncoder) }
    }

    /// Uses `factory` for `method`, replacing the built-in builder if there is one.
    pub fn route(mut self, method: Method, factory: BuilderFactory) -> Self {
        self.routes.insert(method, factory);
        self
    }

    /// Sends `method` back to the pass-through builder.
    pub fn without(mut self, method: &Method) -> Self {
        self.routes.remove(method);
        self
    }

    pub fn encoder(mut self, encoder: impl PayloadEncoder + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    pub fn build(self) -> BuilderSelector {
        BuilderSelector { routes: self.routes, encoder: self.encoder }
    }
}

impl fmt::Debug for BuilderSelectorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderSelectorBuilder").field("routes", &self.routes.len()).finish_non_exhaustive()
    }
}

fn get<'a>(request: &'a NormalizedRequest, _encoder: &'a dyn PayloadEncoder) -> Box<dyn OutboundRequestBuilder + 'a> {
    Box::new(GetRequestBuilder::new(request))
}

fn delete<'a>(request: &'a NormalizedRequest, _encoder: &'a dyn PayloadEncoder) -> Box<dyn OutboundRequestBuilder + 'a> {
    Box::new(DeleteRequestBuilder::new(request))
}

fn patch<'a>(request: &'a NormalizedRequest, encoder: &'a dyn PayloadEncoder) -> Box<dyn OutboundRequestBuilder + 'a> {
    Box::new(PatchRequestBuilder::with_encoder(request, encoder))
}

fn post<'a>(request: &'a NormalizedRequest, encoder: &'a dyn PayloadEncoder) -> Box<dyn OutboundRequestBuilder + 'a> {
    Box::new(PostRequestBuilder::with_encoder(request, encoder))
}

fn put<'a>(request: &'a NormalizedRequest, encoder: &'a dyn PayloadEncoder) -> Box<dyn OutboundRequestBuilder + 'a> {
    Box::new(PutRequestBuilder::with_encoder(request, encoder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RawBody;
    use crate::error::ConfigurationError;
    use bytes::Bytes;
    use http::Uri;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    const TARGET: &str = "https://upstream.example/api/orders/42";

    fn request(method: Method) -> NormalizedRequest {
        NormalizedRequest::builder(method)
            .target_url(Uri::from_static(TARGET))
            .query("force", "true")
            .payload(json!({"status": "shipped"}))
            .raw_body(r#"{"status": "shipped"}"#)
            .build()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();
    }

    async fn body_bytes(outbound: OutboundRequest) -> Bytes {
        outbound.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn delete_scenario() {
        init_tracing();
        let selector = BuilderSelector::default();
        let request = NormalizedRequest::builder(Method::DELETE)
            .target_url(Uri::from_static(TARGET))
            .query("force", "true")
            .build();

        let outbound = selector.build_outbound(&request).unwrap();

        assert_eq!(outbound.method(), Method::DELETE);
        assert_eq!(outbound.uri(), "https://upstream.example/api/orders/42?force=true");
        assert!(body_bytes(outbound).await.is_empty());
    }

    #[tokio::test]
    async fn patch_scenario() {
        init_tracing();
        let selector = BuilderSelector::default();
        let request = request(Method::PATCH);

        let outbound = selector.build_outbound(&request).unwrap();

        assert_eq!(outbound.method(), Method::PATCH);
        assert_eq!(outbound.uri(), TARGET);
        let decoded: Value = serde_json::from_slice(&body_bytes(outbound).await).unwrap();
        assert_eq!(decoded, json!({"status": "shipped"}));
    }

    #[tokio::test]
    async fn unknown_method_falls_back_to_pass_through() {
        let selector = BuilderSelector::default();
        let request = request(Method::OPTIONS);

        let outbound = selector.build_outbound(&request).unwrap();

        assert_eq!(outbound.method(), Method::OPTIONS);
        assert_eq!(outbound.uri(), "https://upstream.example/api/orders/42?force=true");
        assert_eq!(body_bytes(outbound).await.as_ref(), br#"{"status": "shipped"}"#);
    }

    #[test]
    fn selects_by_method() {
        let selector = BuilderSelector::default();

        let cases = [
            (Method::GET, Method::GET),
            (Method::DELETE, Method::DELETE),
            (Method::PATCH, Method::PATCH),
            (Method::POST, Method::POST),
            (Method::PUT, Method::PUT),
            (Method::HEAD, Method::HEAD),
            (Method::TRACE, Method::TRACE),
        ];
        for (inbound, expected) in cases {
            let request = request(inbound);
            assert_eq!(selector.select(&request).method(), expected);
        }

        assert!(selector.is_routed(&Method::PATCH));
        assert!(!selector.is_routed(&Method::OPTIONS));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let selector = BuilderSelector::default();
        let lower_patch = Method::from_bytes(b"patch").unwrap();
        let request = request(lower_patch.clone());

        let builder = selector.select(&request);

        assert_eq!(builder.method(), Method::PATCH);
        assert_eq!(builder.uri().unwrap(), TARGET);
        assert!(selector.is_routed(&lower_patch));
        assert!(!selector.is_routed(&Method::from_bytes(b"purge").unwrap()));
    }

    #[tokio::test]
    async fn routes_can_be_overridden() {
        let selector = BuilderSelector::builder().route(Method::OPTIONS, delete).without(&Method::PUT).build();

        let options = request(Method::OPTIONS);
        let outbound = selector.build_outbound(&options).unwrap();
        assert_eq!(outbound.method(), Method::DELETE);

        let put_request = request(Method::PUT);
        let outbound = selector.build_outbound(&put_request).unwrap();
        assert_eq!(outbound.method(), Method::PUT);
        assert_eq!(outbound.uri(), "https://upstream.example/api/orders/42?force=true");
        assert_eq!(body_bytes(outbound).await.as_ref(), br#"{"status": "shipped"}"#);
    }

    #[tokio::test]
    async fn builders_are_idempotent() {
        let selector = BuilderSelector::default();

        for method in [Method::GET, Method::DELETE, Method::PATCH, Method::POST, Method::PUT, Method::OPTIONS] {
            let request = request(method);
            let builder = selector.select(&request);

            let first = builder.build().unwrap();
            let second = builder.build().unwrap();

            assert_eq!(first.method(), second.method());
            assert_eq!(first.uri(), second.uri());
            assert_eq!(first.headers(), second.headers());
            assert_eq!(body_bytes(first).await, body_bytes(second).await);
        }
    }

    #[test]
    fn missing_target_url_is_reported() {
        init_tracing();
        let selector = BuilderSelector::default();
        let request = NormalizedRequest::builder(Method::DELETE).raw_body(RawBody::empty()).build();

        let error = selector.build_outbound(&request).unwrap_err();

        assert!(matches!(error, ForwardError::Configuration { source: ConfigurationError::MissingTargetUrl }));
    }

    #[test]
    fn selector_is_shareable() {
        fn check_send_sync<T: Send + Sync>() {}
        check_send_sync::<BuilderSelector>();
    }

    mod proptests {
        use super::*;
        use crate::test_utils::{arb_json, arb_query};
        use http_body::Body as HttpBody;
        use proptest::prelude::*;

        fn request_with(method: Method, query: &[(String, String)], payload: Value) -> NormalizedRequest {
            NormalizedRequest::builder(method)
                .target_url(Uri::from_static(TARGET))
                .query_params(query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
                .payload(payload)
                .raw_body("raw inbound body")
                .build()
        }

        fn collect(outbound: OutboundRequest) -> Bytes {
            futures::executor::block_on(outbound.into_body().collect()).unwrap().to_bytes()
        }

        fn any_method() -> impl Strategy<Value = Method> {
            prop::sample::select(vec![
                Method::GET,
                Method::DELETE,
                Method::PATCH,
                Method::POST,
                Method::PUT,
                Method::OPTIONS,
                Method::HEAD,
            ])
        }

        proptest! {
            #[test]
            fn delete_keeps_query_and_drops_body(query in arb_query(), payload in arb_json()) {
                let request = request_with(Method::DELETE, &query, payload);
                let expected = request.query_params().to_query_string().unwrap();

                let outbound = BuilderSelector::default().build_outbound(&request).unwrap();

                prop_assert_eq!(outbound.method(), Method::DELETE);
                prop_assert_eq!(outbound.uri().path(), "/api/orders/42");
                prop_assert_eq!(outbound.uri().query(), expected.as_deref());
                let body = outbound.into_body();
                prop_assert!(body.is_end_stream());
                prop_assert_eq!(body.size_hint().exact(), Some(0));
            }

            #[test]
            fn patch_drops_query_and_round_trips_payload(query in arb_query(), payload in arb_json()) {
                let request = request_with(Method::PATCH, &query, payload.clone());

                let outbound = BuilderSelector::default().build_outbound(&request).unwrap();

                prop_assert_eq!(outbound.method(), Method::PATCH);
                prop_assert_eq!(outbound.uri(), TARGET);
                prop_assert_eq!(outbound.uri().query(), None);
                let decoded: Value = serde_json::from_slice(&collect(outbound)).unwrap();
                prop_assert_eq!(decoded, payload);
            }

            #[test]
            fn building_twice_gives_the_same_request(method in any_method(), query in arb_query(), payload in arb_json()) {
                let request = request_with(method, &query, payload);
                let selector = BuilderSelector::default();
                let builder = selector.select(&request);

                let first = builder.build().unwrap();
                let second = builder.build().unwrap();

                prop_assert_eq!(first.method(), second.method());
                prop_assert_eq!(first.uri(), second.uri());
                prop_assert_eq!(first.headers(), second.headers());
                prop_assert_eq!(collect(first), collect(second));
            }
        }
    }
}
