//! Long-lived, user-issued app tokens.

// self
use crate::{
	_prelude::*,
	auth::token::{
		TokenError, TokenKind,
		record::{CacheRecord, NEVER_EXPIRES},
		secret::TokenSecret,
	},
};

/// Personal/app access token; never expires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppToken {
	/// Bearer secret; callers must avoid logging it.
	pub secret: TokenSecret,
}
impl AppToken {
	const KIND: TokenKind = TokenKind::App;

	/// Wraps a user-supplied token.
	pub fn new(secret: TokenSecret) -> Self {
		Self { secret }
	}

	/// Rebuilds the token from a cache record.
	///
	/// App tokens do not expire, so a stored timestamp is discarded; it must still be well
	/// formed.
	pub fn deserialize(record: &CacheRecord) -> Result<Self, TokenError> {
		super::parse_record_expiry(Self::KIND, record)?;

		Ok(Self { secret: record.access_token.clone() })
	}

	/// Produces the persisted form, always with a `"never"` expiry.
	pub fn serialize(&self) -> Result<CacheRecord, TokenError> {
		Ok(CacheRecord {
			access_token: self.secret.clone(),
			expiry: NEVER_EXPIRES.into(),
			token_type: Self::KIND,
		})
	}
}
impl Display for AppToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("DagsHub app token")
	}
}
