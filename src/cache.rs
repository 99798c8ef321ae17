//! Token cache contract and built-in cache implementations.
//!
//! A cache maps a [`HostId`] to an ordered list of [`CacheRecord`]s, oldest first. The persisted
//! document carries a top-level schema version ([`CACHE_SCHEMA_VERSION`]); readers refuse any
//! other version instead of guessing at its layout.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

// self
use crate::{
	_prelude::*,
	auth::{CacheRecord, HostId, TokenSecret},
};

/// Schema version written to (and required from) persisted caches.
pub const CACHE_SCHEMA_VERSION: &str = "1";

/// Boxed future returned by [`TokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Keyed store of token records shared by every client of the same user.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Returns the host's records, oldest first; an empty list when nothing is cached yet.
	fn load<'a>(&'a self, host: &'a HostId) -> CacheFuture<'a, Vec<CacheRecord>>;

	/// Upserts a record. A record with the same secret is replaced and becomes the most recent.
	///
	/// Must be atomic with respect to concurrent readers.
	fn save<'a>(&'a self, host: &'a HostId, record: CacheRecord) -> CacheFuture<'a, ()>;

	/// Evicts the record holding `secret`, returning whether one was removed.
	fn remove<'a>(&'a self, host: &'a HostId, secret: &'a TokenSecret) -> CacheFuture<'a, bool>;

	/// Evicts every record for `host`, returning how many were removed.
	fn clear<'a>(&'a self, host: &'a HostId) -> CacheFuture<'a, usize>;
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CacheError {
	/// The persisted document could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The persisted document uses a schema this build does not understand.
	#[error("Token cache schema version `{found}` is not supported (expected `{expected}`).")]
	UnsupportedVersion {
		/// Version found in the document.
		found: String,
		/// Version this build reads and writes.
		expected: &'static str,
	},
}

/// Versioned on-disk document: `{"version": "1", "<host>": [records...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDocument {
	/// Schema version tag.
	pub version: String,
	/// Records grouped by host, oldest first.
	#[serde(flatten)]
	pub hosts: BTreeMap<HostId, Vec<CacheRecord>>,
}
impl CacheDocument {
	/// Empty document at the current schema version.
	pub fn new() -> Self {
		Self { version: CACHE_SCHEMA_VERSION.into(), hosts: BTreeMap::new() }
	}

	/// Fails unless the document uses [`CACHE_SCHEMA_VERSION`].
	pub fn ensure_supported(&self) -> Result<(), CacheError> {
		check_version(&self.version)
	}

	/// Records for `host`, oldest first.
	pub fn records(&self, host: &HostId) -> Vec<CacheRecord> {
		self.hosts.get(host).cloned().unwrap_or_default()
	}

	/// Upserts `record` at the most-recent position.
	pub fn upsert(&mut self, host: &HostId, record: CacheRecord) {
		let records = self.hosts.entry(host.clone()).or_default();

		records.retain(|existing| !existing.holds(&record.access_token));
		records.push(record);
	}

	/// Removes the record holding `secret`.
	pub fn remove(&mut self, host: &HostId, secret: &TokenSecret) -> bool {
		let Some(records) = self.hosts.get_mut(host) else {
			return false;
		};
		let before = records.len();

		records.retain(|existing| !existing.holds(secret));

		let removed = records.len() != before;

		if records.is_empty() {
			self.hosts.remove(host);
		}

		removed
	}

	/// Removes every record for `host`.
	pub fn clear(&mut self, host: &HostId) -> usize {
		self.hosts.remove(host).map_or(0, |records| records.len())
	}
}

pub(crate) fn check_version(found: &str) -> Result<(), CacheError> {
	if found == CACHE_SCHEMA_VERSION {
		Ok(())
	} else {
		Err(CacheError::UnsupportedVersion { found: found.into(), expected: CACHE_SCHEMA_VERSION })
	}
}
