//! The inbound side of outbound reconstruction.
//!
//! - [`ExchangeContext`]: read-only view of the exchange owned by the transport layer. The routing layer
//!   stores the upstream it picked as a [`GatewayRequestUrl`] attribute.
//! - [`NormalizedRequest`]: snapshot of one inbound request plus the routing metadata builders need. It is
//!   never mutated once built; builders only read it.
//! - [`QueryParams`]: ordered multi-valued query parameters, kept apart from the headers.

use crate::body::RawBody;
use crate::error::{EncodingError, ForwardError};
use http::request::Parts;
use http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use serde_json::Value;
use tracing::debug;

/// Exchange attribute holding the upstream url resolved by routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequestUrl(pub Uri);

/// Query parameters as `key -> values`.
///
/// Keys keep the order of their first appearance and values keep insertion order. Lookups scan the keys
/// linearly, which stays cheap for the handful of parameters a request carries.
///
/// A parsed query re-encodes to exactly the string it was parsed from, bare flags, percent escapes and key
/// interleaving included, until it is modified. From then on it is form encoded from the pairs.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
    raw: Option<String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query string, without the leading `?`.
    ///
    /// Escapes that do not decode to utf-8 are replaced in the decoded values; the query string itself is
    /// kept as is.
    pub fn parse(query: &str) -> Result<Self, ForwardError> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query)?;
        let mut params = pairs.into_iter().collect::<Self>();
        if !params.is_empty() {
            params.raw = Some(query.to_string());
        }
        Ok(params)
    }

    /// Adds `value` after the existing values of `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        self.raw = None;
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
        self
    }

    /// Replaces every value of `key`; no values removes the key.
    pub fn insert<I, V>(&mut self, key: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = key.into();
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        self.raw = None;
        let position = self.entries.iter().position(|(k, _)| *k == key);
        match (position, values.is_empty()) {
            (Some(index), true) => {
                self.entries.remove(index);
            }
            (Some(index), false) => self.entries[index].1 = values,
            (None, true) => {}
            (None, false) => self.entries.push((key, values)),
        }
        self
    }

    /// Returns the first value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, values)| values.as_slice()).unwrap_or_default()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every `(key, value)` pair, values of one key adjacent and in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(key, values)| values.iter().map(move |value| (key.as_str(), value.as_str())))
    }

    /// Encodes the parameters as a query string; `None` when there is nothing to encode.
    pub fn to_query_string(&self) -> Result<Option<String>, EncodingError> {
        if self.is_empty() {
            return Ok(None);
        }
        if let Some(raw) = &self.raw {
            return Ok(Some(raw.clone()));
        }
        let pairs = self.iter().collect::<Vec<_>>();
        Ok(Some(serde_urlencoded::to_string(pairs)?))
    }
}

impl PartialEq for QueryParams {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for QueryParams {}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

/// Read-only view of the exchange the request belongs to.
///
/// Gives access to the original transport-level method, uri and headers, and to the attributes other
/// gateway stages attached to the exchange.
#[derive(Debug)]
pub struct ExchangeContext {
    inner: Request<()>,
}

impl ExchangeContext {
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn attributes(&self) -> &Extensions {
        self.inner.extensions()
    }

    /// Only for the stages that run before outbound reconstruction, e.g. routing storing its decision.
    pub fn attributes_mut(&mut self) -> &mut Extensions {
        self.inner.extensions_mut()
    }

    /// The upstream url resolved by routing, if routing ran.
    pub fn target_url(&self) -> Option<&Uri> {
        self.attributes().get::<GatewayRequestUrl>().map(|url| &url.0)
    }
}

impl From<Parts> for ExchangeContext {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

impl From<Request<()>> for ExchangeContext {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

/// One inbound request, normalized, at the point outbound reconstruction starts.
#[derive(Debug)]
pub struct NormalizedRequest {
    method: Method,
    headers: HeaderMap,
    query_params: QueryParams,
    target_url: Option<Uri>,
    payload: Option<Value>,
    raw_body: RawBody,
}

impl NormalizedRequest {
    pub fn builder(method: Method) -> NormalizedRequestBuilder {
        NormalizedRequestBuilder::new(method)
    }

    /// Builds the request from the exchange, falling back to its transport-level method, headers and query.
    ///
    /// `payload` is the already decoded body and `raw_body` the original bytes; decoding is not done here.
    pub fn from_exchange(exchange: &ExchangeContext, payload: Option<Value>, raw_body: RawBody) -> Result<Self, ForwardError> {
        let query_params = match exchange.uri().query() {
            Some(query) => QueryParams::parse(query)?,
            None => QueryParams::new(),
        };

        let target_url = exchange.target_url().cloned();
        if target_url.is_none() {
            debug!(method = %exchange.method(), uri = %exchange.uri(), "exchange has no gateway request url yet");
        }

        Ok(Self {
            method: exchange.method().clone(),
            headers: exchange.headers().clone(),
            query_params,
            target_url,
            payload,
            raw_body,
        })
    }

    /// The method as received from the client.
    pub fn original_method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    pub fn target_url(&self) -> Option<&Uri> {
        self.target_url.as_ref()
    }

    /// The decoded body, `None` when the client sent none.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn raw_body(&self) -> &RawBody {
        &self.raw_body
    }
}

#[derive(Debug)]
pub struct NormalizedRequestBuilder {
    request: NormalizedRequest,
}

impl NormalizedRequestBuilder {
    fn new(method: Method) -> Self {
        Self {
            request: NormalizedRequest {
                method,
                headers: HeaderMap::new(),
                query_params: QueryParams::new(),
                target_url: None,
                payload: None,
                raw_body: RawBody::empty(),
            },
        }
    }

    /// Appends a header value, keeping the values already present for `name`.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.request.headers.append(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.request.headers = headers;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query_params.append(key, value);
        self
    }

    pub fn query_params(mut self, query_params: QueryParams) -> Self {
        self.request.query_params = query_params;
        self
    }

    pub fn target_url(mut self, target_url: Uri) -> Self {
        self.request.target_url = Some(target_url);
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.request.payload = Some(payload);
        self
    }

    pub fn raw_body(mut self, raw_body: impl Into<RawBody>) -> Self {
        self.request.raw_body = raw_body.into();
        self
    }

    pub fn build(self) -> NormalizedRequest {
        self.request
    }
}
