//! Crate-level error types shared across tokens, caches, selection, and signing.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Cache-layer failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A token could not be (de)serialized; usually a corrupted cache record.
	#[error(transparent)]
	Token(#[from] crate::auth::TokenError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// No cached or environment token is usable and acquisition failed or is unavailable.
	#[error("No usable credential for {host}; run `dagshub login` to authenticate.")]
	NoUsableCredential {
		/// Host the credential was requested for.
		host: String,
		/// Acquisition failure, when an acquirer ran.
		#[source]
		source: Option<crate::acquire::AcquireError>,
	},
	/// The host answered `401 Unauthorized` again after the token was renegotiated.
	#[error("{host} rejected the renegotiated credential.")]
	AuthenticationRejected {
		/// Host that rejected the request.
		host: String,
	},
	/// The token cannot be encoded as an `Authorization` header value.
	#[error("Token cannot be used as an Authorization header value.")]
	InvalidHeader,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Host value is not an absolute http(s) URL.
	#[error("Host `{value}` is invalid.")]
	InvalidHost {
		/// Rejected host value.
		value: String,
		/// Underlying validation failure.
		#[source]
		source: crate::auth::HostError,
	},
	/// No cache location was configured and the platform exposes no user cache directory.
	#[error("Unable to determine a user cache directory for the token cache.")]
	MissingCacheDir,
	/// A request path cannot be resolved against the host.
	#[error("Path `{path}` cannot be resolved against the host.")]
	InvalidRequestPath {
		/// Rejected path.
		path: String,
		/// URL resolution failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the host.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the host.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
