//! Bearer credential resolution for DagsHub clients: prioritized OAuth, app, and environment
//! tokens, a versioned cross-process token cache, and 401-aware request signing.
//!
//! The moving parts, leaves first:
//!
//! - [`auth::Token`] is the closed set of credential kinds with their own expiry and cache
//!   (de)serialization rules.
//! - [`cache::TokenCache`] is the persisted `host -> records` contract, with [`cache::FileCache`]
//!   and [`cache::MemoryCache`] implementations.
//! - [`select::Selector`] turns cached and environment candidates into exactly one usable token,
//!   falling back to an [`acquire::TokenAcquirer`] on a miss.
//! - [`authenticator::Authenticator`] binds the selected token to a client and drives the
//!   sign / inspect / retry-once protocol.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod acquire;
pub mod auth;
pub mod authenticator;
pub mod cache;
pub mod config;
pub mod error;
#[cfg(feature = "reqwest")] pub mod http;
pub mod obs;
pub mod select;
pub mod sign;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		acquire::{AcquireError, AcquireFuture, AcquiredToken, TokenAcquirer},
		auth::{HostId, TokenSecret},
		cache::{MemoryCache, TokenCache},
		config::AuthConfig,
		select::Selector,
	};

	/// Host used by test configurations.
	pub const TEST_HOST: &str = "https://dagshub.test";

	/// Acquirer that hands out a scripted sequence of results and counts invocations.
	#[derive(Debug, Default)]
	pub struct ScriptedAcquirer {
		results: Mutex<Vec<Result<AcquiredToken, AcquireError>>>,
		calls: AtomicUsize,
	}
	impl ScriptedAcquirer {
		/// Queues results; they are handed out first-in, first-out.
		pub fn new(results: impl IntoIterator<Item = Result<AcquiredToken, AcquireError>>) -> Self {
			let mut results = results.into_iter().collect::<Vec<_>>();

			results.reverse();

			Self { results: Mutex::new(results), calls: AtomicUsize::new(0) }
		}

		/// Acquirer that always succeeds once with the provided secret, valid for one hour.
		pub fn granting(secret: &str) -> Self {
			Self::new([Ok(AcquiredToken::new(
				TokenSecret::new(secret),
				Some(OffsetDateTime::now_utc() + Duration::hours(1)),
			))])
		}

		/// Number of times [`TokenAcquirer::acquire`] ran.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl TokenAcquirer for ScriptedAcquirer {
		fn acquire<'a>(&'a self, _host: &'a HostId) -> AcquireFuture<'a> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let next = self.results.lock().pop();

			Box::pin(async move { next.unwrap_or(Err(AcquireError::Cancelled)) })
		}
	}

	/// Configuration bound to [`TEST_HOST`] with no environment token.
	pub fn test_config() -> AuthConfig {
		AuthConfig::from_lookup(|key| match key {
			crate::config::HOST_KEY => Some(TEST_HOST.into()),
			crate::config::TOKENS_CACHE_LOCATION_KEY => Some("unused-test-cache".into()),
			_ => None,
		})
		.expect("Test configuration should build.")
	}

	/// Parsed [`TEST_HOST`].
	pub fn test_host() -> HostId {
		HostId::new(TEST_HOST).expect("Test host should be valid.")
	}

	/// Builds a selector over a fresh [`MemoryCache`], returning both.
	pub fn memory_selector(
		config: AuthConfig,
		acquirer: Option<Arc<dyn TokenAcquirer>>,
	) -> (Selector, Arc<MemoryCache>) {
		let cache = Arc::new(MemoryCache::default());
		let dyn_cache: Arc<dyn TokenCache> = cache.clone();
		let mut selector = Selector::new(Arc::new(config), dyn_cache);

		if let Some(acquirer) = acquirer {
			selector = selector.with_acquirer(acquirer);
		}

		(selector, cache)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
#[cfg(test)] use {httpmock as _, tokio as _};
