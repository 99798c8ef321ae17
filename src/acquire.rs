//! Contract for the interactive OAuth acquisition flow that runs on a selection miss.
//!
//! The device/browser handshake itself lives outside this crate; implementors only hand back the
//! resulting secret and its expiry.

// self
use crate::{
	_prelude::*,
	auth::{HostId, OAuthToken, TokenSecret},
};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Boxed future returned by [`TokenAcquirer::acquire`].
pub type AcquireFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AcquiredToken, AcquireError>> + 'a + Send>>;

/// Obtains a fresh OAuth token for a host, typically by prompting the user.
///
/// Called at most once per selection miss; failures are never retried by the caller.
pub trait TokenAcquirer
where
	Self: Send + Sync,
{
	/// Runs the handshake against `host`.
	fn acquire<'a>(&'a self, host: &'a HostId) -> AcquireFuture<'a>;
}

/// Successful handshake result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquiredToken {
	/// Bearer secret.
	pub secret: TokenSecret,
	/// Expiry instant; `None` if the provider did not report one.
	pub expiry: Option<OffsetDateTime>,
}
impl AcquiredToken {
	/// Wraps a handshake result.
	pub fn new(secret: TokenSecret, expiry: Option<OffsetDateTime>) -> Self {
		Self { secret, expiry }
	}

	/// Convenience constructor from a relative lifetime measured from now.
	pub fn expires_in(secret: impl Into<String>, lifetime: Duration) -> Self {
		Self::new(TokenSecret::new(secret), Some(OffsetDateTime::now_utc() + lifetime))
	}
}
impl From<AcquiredToken> for OAuthToken {
	fn from(value: AcquiredToken) -> Self {
		OAuthToken::new(value.secret, value.expiry)
	}
}

/// Handshake failure.
#[derive(Debug, ThisError)]
pub enum AcquireError {
	/// The user aborted the flow.
	#[error("Authentication was cancelled.")]
	Cancelled,
	/// The flow failed (network error, provider rejection, ...).
	#[error("Authentication failed: {message}.")]
	Failed {
		/// Human-readable summary.
		message: String,
		/// Underlying failure, when available.
		#[source]
		source: Option<BoxError>,
	},
}
impl AcquireError {
	/// Failure with a message and no underlying error.
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed { message: message.into(), source: None }
	}

	/// Failure wrapping an underlying error.
	pub fn with_source(
		message: impl Into<String>,
		src: impl 'static + Send + Sync + StdError,
	) -> Self {
		Self::Failed { message: message.into(), source: Some(Box::new(src)) }
	}
}
