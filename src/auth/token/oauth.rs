//! Short-lived tokens produced by the interactive OAuth handshake.

// self
use crate::{
	_prelude::*,
	auth::token::{
		TokenError, TokenKind,
		record::{self, CacheRecord},
		secret::TokenSecret,
	},
};

/// OAuth-issued bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthToken {
	/// Bearer secret; callers must avoid logging it.
	pub secret: TokenSecret,
	/// Expiry instant; `None` when the cache recorded `"never"`.
	pub expiry: Option<OffsetDateTime>,
}
impl OAuthToken {
	const KIND: TokenKind = TokenKind::OAuth;

	/// Creates a token from a handshake result.
	pub fn new(secret: TokenSecret, expiry: Option<OffsetDateTime>) -> Self {
		Self { secret, expiry }
	}

	/// Rebuilds the token from a cache record.
	pub fn deserialize(record: &CacheRecord) -> Result<Self, TokenError> {
		let expiry = super::parse_record_expiry(Self::KIND, record)?;

		Ok(Self { secret: record.access_token.clone(), expiry })
	}

	/// Produces the persisted form.
	pub fn serialize(&self) -> Result<CacheRecord, TokenError> {
		Ok(CacheRecord {
			access_token: self.secret.clone(),
			expiry: record::format_expiry(self.expiry)?,
			token_type: Self::KIND,
		})
	}

	/// Returns `true` if the token expired before `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expiry.is_some_and(|expiry| expiry < now)
	}

	/// Time left before expiry at `now`, if the token expires at all.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Option<Duration> {
		self.expiry.map(|expiry| expiry - now)
	}
}
impl Display for OAuthToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.expiry {
			Some(expiry) => write!(f, "DagsHub OAuth token, valid until {expiry}"),
			None => f.write_str("DagsHub OAuth token, no expiry"),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn serialize_writes_bearer_record() {
		let token = OAuthToken::new(
			TokenSecret::new("abc"),
			Some(macros::datetime!(2025-01-01 00:00 UTC)),
		);
		let record = token.serialize().expect("OAuth token should serialize.");

		assert_eq!(record, CacheRecord::new(TokenKind::OAuth, "abc", "2025-01-01T00:00:00Z"));
	}

	#[test]
	fn remaining_reports_time_left() {
		let token = OAuthToken::new(
			TokenSecret::new("abc"),
			Some(macros::datetime!(2025-01-01 01:00 UTC)),
		);

		assert_eq!(
			token.remaining_at(macros::datetime!(2025-01-01 00:30 UTC)),
			Some(Duration::minutes(30))
		);

		let forever = OAuthToken::new(TokenSecret::new("abc"), None);

		assert_eq!(forever.remaining_at(OffsetDateTime::now_utc()), None);
	}
}
