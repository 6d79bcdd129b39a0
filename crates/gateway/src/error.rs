use http::StatusCode;
use thiserror::Error;

/// Top-level error returned while building an outbound request.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("configuration error: {source}")]
    Configuration {
        #[from]
        source: ConfigurationError,
    },

    #[error("encoding error: {source}")]
    Encoding {
        #[from]
        source: EncodingError,
    },

    #[error("body error: {source}")]
    Body {
        #[from]
        source: BodyError,
    },

    #[error("invalid query string: {source}")]
    InvalidQuery {
        #[from]
        source: serde_urlencoded::de::Error,
    },
}

impl ForwardError {
    /// Returns true when the failure comes from a broken gateway pipeline rather than from the request itself.
    ///
    /// Fatal errors must fail the whole exchange; rebuilding the same request will fail again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// The status code the gateway should answer the client with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration { .. } | Self::Body { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Encoding { source: EncodingError::Json { .. } } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Encoding { source: EncodingError::Query { .. } } | Self::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

/// Routing metadata is missing or unusable; the routing layer did not run (or ran wrong) before this one.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("gateway request url is missing from the exchange")]
    MissingTargetUrl,

    #[error("gateway request url must be absolute, got: {url}")]
    RelativeTargetUrl { url: String },

    #[error("invalid outbound uri: {reason}")]
    InvalidUri { reason: String },
}

impl ConfigurationError {
    pub fn relative_target_url<S: ToString>(url: S) -> Self {
        Self::RelativeTargetUrl { url: url.to_string() }
    }

    pub fn invalid_uri<S: ToString>(str: S) -> Self {
        Self::InvalidUri { reason: str.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("payload can't be encoded as json: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("query parameters can't be encoded: {source}")]
    Query {
        #[from]
        source: serde_urlencoded::ser::Error,
    },
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("body has been consumed")]
    Consumed,

    #[error("body stream error: {reason}")]
    Stream { reason: String },
}

impl BodyError {
    pub fn stream<S: ToString>(str: S) -> Self {
        Self::Stream { reason: str.to_string() }
    }
}
