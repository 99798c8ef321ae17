//! The closed set of credential variants and their shared contract.
//!
//! Every variant knows its secret, whether it is expired, and how (or whether) it round-trips
//! through a [`CacheRecord`]. The `token_type` discriminant on the wire maps one-to-one onto
//! [`TokenKind`], so dispatch is an exhaustive `match` rather than open-ended subclassing.

pub mod app;
pub mod env_var;
pub mod oauth;
pub mod record;
pub mod secret;

// self
use crate::{
	_prelude::*,
	auth::{
		HostId,
		token::{
			app::AppToken, env_var::EnvVarToken, oauth::OAuthToken, record::CacheRecord,
			secret::TokenSecret,
		},
	},
	sign::{self, Signable},
};

/// Discriminant of a credential variant, as written in the cache's `token_type` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
	/// Short-lived token from the interactive OAuth handshake.
	#[serde(rename = "bearer")]
	OAuth,
	/// Long-lived user-issued access token.
	#[serde(rename = "app-token")]
	App,
	/// Token injected through the process environment; never persisted.
	#[serde(rename = "env-var")]
	EnvVar,
}
impl TokenKind {
	/// Selection priority; lower values win.
	pub const fn priority(self) -> i32 {
		match self {
			TokenKind::OAuth => 1,
			TokenKind::App => 0,
			TokenKind::EnvVar => -1,
		}
	}

	/// Returns the stable wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::OAuth => "bearer",
			TokenKind::App => "app-token",
			TokenKind::EnvVar => "env-var",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Operation that a variant refused to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenOperation {
	/// Writing the token into a cache record.
	Serialize,
	/// Rebuilding the token from a cache record.
	Deserialize,
}
impl Display for TokenOperation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			TokenOperation::Serialize => "serialize",
			TokenOperation::Deserialize => "deserialize",
		})
	}
}

/// Token (de)serialization failures.
#[derive(Debug, ThisError)]
pub enum TokenError {
	/// A cached record's expiry is neither `"never"` nor a valid timestamp.
	#[error("Cached {kind} token has a malformed expiry `{value}`.")]
	Deserialization {
		/// Kind of the offending record.
		kind: TokenKind,
		/// Raw expiry value.
		value: String,
		/// Timestamp parsing failure.
		#[source]
		source: time::error::Parse,
	},
	/// The variant cannot take part in the requested operation.
	#[error("Cannot {operation} a {kind} token.")]
	UnsupportedOperation {
		/// Variant that refused.
		kind: TokenKind,
		/// Refused operation.
		operation: TokenOperation,
	},
	/// The expiry cannot be rendered as RFC 3339.
	#[error("Token expiry cannot be formatted for storage.")]
	ExpiryFormat(#[from] time::error::Format),
}

/// One concrete credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
	/// OAuth-issued, usually expiring.
	OAuth(OAuthToken),
	/// Long-lived app token.
	App(AppToken),
	/// Environment-supplied token.
	EnvVar(EnvVarToken),
}
impl Token {
	/// Rebuilds a token from its cache record, dispatching on `token_type`.
	pub fn deserialize(record: &CacheRecord) -> Result<Self, TokenError> {
		match record.token_type {
			TokenKind::OAuth => OAuthToken::deserialize(record).map(Self::OAuth),
			TokenKind::App => AppToken::deserialize(record).map(Self::App),
			TokenKind::EnvVar => EnvVarToken::deserialize(record).map(Self::EnvVar),
		}
	}

	/// Produces the persisted form. Environment tokens refuse.
	pub fn serialize(&self) -> Result<CacheRecord, TokenError> {
		match self {
			Self::OAuth(token) => token.serialize(),
			Self::App(token) => token.serialize(),
			Self::EnvVar(token) => token.serialize(),
		}
	}

	/// Variant discriminant.
	pub fn kind(&self) -> TokenKind {
		match self {
			Self::OAuth(_) => TokenKind::OAuth,
			Self::App(_) => TokenKind::App,
			Self::EnvVar(_) => TokenKind::EnvVar,
		}
	}

	/// Selection priority; lower values win.
	pub fn priority(&self) -> i32 {
		self.kind().priority()
	}

	/// The bearer secret.
	pub fn secret(&self) -> &TokenSecret {
		match self {
			Self::OAuth(token) => &token.secret,
			Self::App(token) => &token.secret,
			Self::EnvVar(token) => &token.secret,
		}
	}

	/// The raw bearer value sent on the wire. Never log it.
	pub fn token_text(&self) -> &str {
		self.secret().expose()
	}

	/// Expiry instant; `None` means the token never expires.
	pub fn expiry(&self) -> Option<OffsetDateTime> {
		match self {
			Self::OAuth(token) => token.expiry,
			Self::App(_) | Self::EnvVar(_) => None,
		}
	}

	/// Returns `true` if the token expired before `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		match self {
			Self::OAuth(token) => token.is_expired_at(now),
			Self::App(_) | Self::EnvVar(_) => false,
		}
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` for variants that may be written to a cache.
	pub fn is_persistable(&self) -> bool {
		!matches!(self, Self::EnvVar(_))
	}

	/// Sets `Authorization: Bearer <secret>` on the request, replacing any existing value.
	pub fn sign<R>(&self, request: R) -> Result<R>
	where
		R: Signable,
	{
		sign::attach_bearer(request, self.secret())
	}
}
impl From<OAuthToken> for Token {
	fn from(value: OAuthToken) -> Self {
		Self::OAuth(value)
	}
}
impl From<AppToken> for Token {
	fn from(value: AppToken) -> Self {
		Self::App(value)
	}
}
impl From<EnvVarToken> for Token {
	fn from(value: EnvVarToken) -> Self {
		Self::EnvVar(value)
	}
}
impl Display for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::OAuth(token) => Display::fmt(token, f),
			Self::App(token) => Display::fmt(token, f),
			Self::EnvVar(token) => Display::fmt(token, f),
		}
	}
}

pub(crate) fn parse_record_expiry(
	kind: TokenKind,
	record: &CacheRecord,
) -> Result<Option<OffsetDateTime>, TokenError> {
	record::parse_expiry(&record.expiry).map_err(|source| TokenError::Deserialization {
		kind,
		value: record.expiry.clone(),
		source,
	})
}

pub(crate) fn unsupported(kind: TokenKind, operation: TokenOperation) -> TokenError {
	TokenError::UnsupportedOperation { kind, operation }
}

/// Convenience constructor for environment tokens bound to `host`.
pub fn env_token(secret: impl Into<String>, host: HostId) -> Token {
	Token::EnvVar(EnvVarToken::new(TokenSecret::new(secret), host))
}
