//! Thread-safe in-memory [`TokenCache`] implementation for tests and short-lived tools.

// self
use crate::{
	_prelude::*,
	auth::{CacheRecord, HostId, TokenSecret},
	cache::{CacheDocument, CacheFuture, TokenCache},
};

type CacheMap = Arc<RwLock<CacheDocument>>;

/// Cache backend that keeps records in-process; nothing survives a restart.
#[derive(Clone, Debug)]
pub struct MemoryCache(CacheMap);
impl MemoryCache {
	/// Seeds the cache with records for `host`, oldest first.
	pub fn with_records(host: &HostId, records: impl IntoIterator<Item = CacheRecord>) -> Self {
		let cache = Self::default();

		{
			let mut guard = cache.0.write();

			for record in records {
				guard.upsert(host, record);
			}
		}

		cache
	}

	/// Copy of the whole document, for assertions.
	pub fn snapshot(&self) -> CacheDocument {
		self.0.read().clone()
	}

	fn load_now(map: CacheMap, host: HostId) -> Vec<CacheRecord> {
		map.read().records(&host)
	}

	fn save_now(map: CacheMap, host: HostId, record: CacheRecord) {
		map.write().upsert(&host, record);
	}
}
impl Default for MemoryCache {
	fn default() -> Self {
		Self(Arc::new(RwLock::new(CacheDocument::new())))
	}
}
impl TokenCache for MemoryCache {
	fn load<'a>(&'a self, host: &'a HostId) -> CacheFuture<'a, Vec<CacheRecord>> {
		let map = self.0.clone();
		let host = host.to_owned();

		Box::pin(async move { Ok(Self::load_now(map, host)) })
	}

	fn save<'a>(&'a self, host: &'a HostId, record: CacheRecord) -> CacheFuture<'a, ()> {
		let map = self.0.clone();
		let host = host.to_owned();

		Box::pin(async move {
			Self::save_now(map, host, record);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, host: &'a HostId, secret: &'a TokenSecret) -> CacheFuture<'a, bool> {
		Box::pin(async move { Ok(self.0.write().remove(host, secret)) })
	}

	fn clear<'a>(&'a self, host: &'a HostId) -> CacheFuture<'a, usize> {
		Box::pin(async move { Ok(self.0.write().clear(host)) })
	}
}
