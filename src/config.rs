//! Immutable client configuration, resolved once at process start.
//!
//! The environment is read only by [`AuthConfig::from_env`]; everything downstream receives the
//! resulting value explicitly.

// std
use std::{env, path::PathBuf};
// crates.io
use directories::BaseDirs;
// self
use crate::{
	_prelude::*,
	auth::{HostId, TokenSecret},
	error::ConfigError,
};

/// Environment key overriding the host name (a bare host name or a full origin).
pub const HOST_KEY: &str = "DAGSHUB_CLIENT_HOST";
/// Environment key overriding the OAuth client identifier.
pub const CLIENT_ID_KEY: &str = "DAGSHUB_CLIENT_ID";
/// Environment key overriding the token cache path.
pub const TOKENS_CACHE_LOCATION_KEY: &str = "DAGSHUB_CLIENT_TOKENS_CACHE";
/// Environment key supplying a user token that bypasses the cache.
pub const USER_TOKEN_KEY: &str = "DAGSHUB_USER_TOKEN";

/// Host used when [`HOST_KEY`] is unset.
pub const DEFAULT_HOST: &str = "https://dagshub.com";
/// OAuth client identifier used when [`CLIENT_ID_KEY`] is unset.
pub const DEFAULT_CLIENT_ID: &str =
	"32b60ba385aa7cecf24046d8195a71c07dd345d9657977863b52e7748e0f0f28";

/// Process-wide client configuration.
#[derive(Clone)]
pub struct AuthConfig {
	/// Default host for selection and environment-token binding.
	pub host: HostId,
	/// OAuth client identifier handed to the acquisition flow.
	pub client_id: String,
	/// Token cache file location.
	pub cache_location: PathBuf,
	/// Token supplied through [`USER_TOKEN_KEY`], if any.
	pub env_token: Option<TokenSecret>,
}
impl AuthConfig {
	/// Resolves the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Resolves the configuration through `lookup`, which maps an environment key to its value.
	///
	/// Empty values are treated as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let host = match read(HOST_KEY) {
			Some(value) => parse_host(&value)?,
			None => parse_host(DEFAULT_HOST)?,
		};
		let client_id = read(CLIENT_ID_KEY).unwrap_or_else(|| DEFAULT_CLIENT_ID.into());
		let cache_location = match read(TOKENS_CACHE_LOCATION_KEY) {
			Some(path) => PathBuf::from(path),
			None => default_cache_location()?,
		};
		let env_token = read(USER_TOKEN_KEY).map(TokenSecret::new);

		Ok(Self { host, client_id, cache_location, env_token })
	}

	/// Overrides the default host.
	pub fn with_host(mut self, host: HostId) -> Self {
		self.host = host;

		self
	}

	/// Overrides the OAuth client identifier.
	pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Overrides the token cache location.
	pub fn with_cache_location(mut self, path: impl Into<PathBuf>) -> Self {
		self.cache_location = path.into();

		self
	}

	/// Sets or clears the environment token.
	pub fn with_env_token(mut self, token: Option<TokenSecret>) -> Self {
		self.env_token = token;

		self
	}
}
impl Debug for AuthConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthConfig")
			.field("host", &self.host)
			.field("client_id", &self.client_id)
			.field("cache_location", &self.cache_location)
			.field("env_token_set", &self.env_token.is_some())
			.finish()
	}
}

/// Default cache file: `<user cache dir>/dagshub/tokens`.
pub fn default_cache_location() -> Result<PathBuf, ConfigError> {
	let dirs = BaseDirs::new().ok_or(ConfigError::MissingCacheDir)?;

	Ok(dirs.cache_dir().join("dagshub").join("tokens"))
}

fn parse_host(value: &str) -> Result<HostId, ConfigError> {
	HostId::from_hostname(value)
		.map_err(|source| ConfigError::InvalidHost { value: value.into(), source })
}
