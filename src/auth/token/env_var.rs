//! Tokens injected through the process environment.

// self
use crate::{
	_prelude::*,
	auth::{
		HostId,
		token::{TokenError, TokenKind, TokenOperation, record::CacheRecord, secret::TokenSecret},
	},
};

/// Environment-supplied token, scoped to the host it was configured for.
///
/// These live only as long as the process and are never written to a cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvVarToken {
	/// Bearer secret; callers must avoid logging it.
	pub secret: TokenSecret,
	/// Host the token is bound to.
	pub host: HostId,
}
impl EnvVarToken {
	const KIND: TokenKind = TokenKind::EnvVar;

	/// Binds an environment secret to `host`.
	pub fn new(secret: TokenSecret, host: HostId) -> Self {
		Self { secret, host }
	}

	/// Always fails; environment tokens are never read from a cache.
	pub fn deserialize(_record: &CacheRecord) -> Result<Self, TokenError> {
		Err(super::unsupported(Self::KIND, TokenOperation::Deserialize))
	}

	/// Always fails; environment tokens are never written to a cache.
	pub fn serialize(&self) -> Result<CacheRecord, TokenError> {
		Err(super::unsupported(Self::KIND, TokenOperation::Serialize))
	}
}
impl Display for EnvVarToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "DagsHub env var token for host {}", self.host)
	}
}
