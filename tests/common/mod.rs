//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	path::{Path, PathBuf},
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use tempfile::TempDir;
// self
use dagshub_auth::{
	acquire::{AcquireError, AcquireFuture, AcquiredToken, TokenAcquirer},
	auth::HostId,
	config::{AuthConfig, HOST_KEY, TOKENS_CACHE_LOCATION_KEY, USER_TOKEN_KEY},
	time::Duration,
};

/// Acquirer that grants the same secret every time (or always cancels) and counts calls.
#[derive(Debug)]
pub struct CountingAcquirer {
	secret: Option<String>,
	calls: AtomicUsize,
}
impl CountingAcquirer {
	pub fn granting(secret: &str) -> Arc<Self> {
		Arc::new(Self { secret: Some(secret.into()), calls: AtomicUsize::new(0) })
	}

	pub fn cancelling() -> Arc<Self> {
		Arc::new(Self { secret: None, calls: AtomicUsize::new(0) })
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl TokenAcquirer for CountingAcquirer {
	fn acquire<'a>(&'a self, _host: &'a HostId) -> AcquireFuture<'a> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let secret = self.secret.clone();

		Box::pin(async move {
			match secret {
				Some(secret) => Ok(AcquiredToken::expires_in(secret, Duration::hours(1))),
				None => Err(AcquireError::Cancelled),
			}
		})
	}
}

/// Cache file inside a temporary directory that is removed on drop.
pub struct TempCacheFile {
	dir: TempDir,
	path: PathBuf,
}
impl TempCacheFile {
	pub fn new(label: &str) -> Self {
		let dir = TempDir::new().expect("Failed to create a temporary directory.");
		let path = dir.path().join(format!("{label}.json"));

		Self { dir, path }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn dir(&self) -> &Path {
		self.dir.path()
	}
}

pub fn host(value: &str) -> HostId {
	HostId::new(value).expect("Host fixture should be valid.")
}

pub fn config(host: &str, cache: &Path, env_token: Option<&str>) -> AuthConfig {
	let host = host.to_owned();
	let cache = cache.display().to_string();
	let env_token = env_token.map(str::to_owned);

	AuthConfig::from_lookup(move |key| match key {
		HOST_KEY => Some(host.clone()),
		TOKENS_CACHE_LOCATION_KEY => Some(cache.clone()),
		USER_TOKEN_KEY => env_token.clone(),
		_ => None,
	})
	.expect("Configuration fixture should build.")
}
