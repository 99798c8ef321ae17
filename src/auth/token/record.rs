//! Persisted cache record shape and the expiry wire format.

// crates.io
use time::format_description::well_known::{Iso8601, Rfc3339};
// self
use crate::{
	_prelude::*,
	auth::token::{TokenKind, secret::TokenSecret},
};

/// Literal stored in place of a timestamp for tokens that never expire.
pub const NEVER_EXPIRES: &str = "never";

/// Persisted form of a cacheable token.
///
/// Wire shape: `{"access_token": "...", "expiry": "<ISO-8601>" | "never", "token_type": "..."}`.
/// `expiry` stays a raw string here so a malformed value surfaces as
/// [`TokenError::Deserialization`](crate::auth::TokenError::Deserialization) when the token is
/// rebuilt, instead of failing the whole cache document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
	/// Bearer secret.
	pub access_token: TokenSecret,
	/// ISO-8601 timestamp or [`NEVER_EXPIRES`].
	pub expiry: String,
	/// Variant discriminant.
	pub token_type: TokenKind,
}
impl CacheRecord {
	/// Builds a record directly from its wire fields.
	pub fn new(
		token_type: TokenKind,
		access_token: impl Into<String>,
		expiry: impl Into<String>,
	) -> Self {
		Self { access_token: TokenSecret::new(access_token), expiry: expiry.into(), token_type }
	}

	/// Returns `true` if the record carries the provided secret.
	pub fn holds(&self, secret: &TokenSecret) -> bool {
		&self.access_token == secret
	}
}

/// Parses a stored expiry: `None` for [`NEVER_EXPIRES`], otherwise an ISO-8601 timestamp.
pub fn parse_expiry(value: &str) -> Result<Option<OffsetDateTime>, time::error::Parse> {
	if value == NEVER_EXPIRES {
		return Ok(None);
	}

	match OffsetDateTime::parse(value, &Iso8601::DEFAULT) {
		Ok(instant) => Ok(Some(instant)),
		Err(e) => OffsetDateTime::parse(value, &Rfc3339).map(Some).map_err(|_| e),
	}
}

/// Renders an expiry for storage; the inverse of [`parse_expiry`].
pub fn format_expiry(expiry: Option<OffsetDateTime>) -> Result<String, time::error::Format> {
	match expiry {
		Some(instant) => instant.format(&Rfc3339),
		None => Ok(NEVER_EXPIRES.into()),
	}
}
