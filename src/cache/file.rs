//! JSON file-backed [`TokenCache`] shared by every process of the same user.

// std
use std::{
	fs,
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
	sync::LazyLock,
};
// crates.io
use tempfile::NamedTempFile;
// self
use crate::{
	_prelude::*,
	auth::{CacheRecord, HostId, TokenSecret},
	cache::{self, CacheDocument, CacheError, CacheFuture, TokenCache},
	config::AuthConfig,
};

type WriteLocks = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

// Shared by every `FileCache` of the process that points at the same path.
static WRITE_LOCKS: LazyLock<WriteLocks> = LazyLock::new(Default::default);

#[derive(Deserialize)]
struct VersionProbe {
	version: String,
}

/// Persists records to a JSON file.
///
/// Every read goes to disk so writes from other processes are observed. Writes are
/// read-modify-write cycles serialized within the process by a per-path lock and published
/// through a fresh temporary file in the same directory followed by a `rename`, so readers only
/// ever see a complete document.
#[derive(Clone, Debug)]
pub struct FileCache {
	path: PathBuf,
	write_lock: Arc<Mutex<()>>,
}
impl FileCache {
	/// Cache at an explicit path. Nothing is touched until the first operation.
	pub fn open(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let write_lock = WRITE_LOCKS.lock().entry(path.clone()).or_default().clone();

		Self { path, write_lock }
	}

	/// Cache at [`AuthConfig::cache_location`].
	pub fn from_config(config: &AuthConfig) -> Self {
		Self::open(config.cache_location.clone())
	}

	/// Location of the cache file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_document(path: &Path) -> Result<CacheDocument, CacheError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CacheDocument::new()),
			Err(e) =>
				return Err(CacheError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				}),
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(CacheDocument::new());
		}

		let probe: VersionProbe = Self::parse(path, &bytes)?;

		cache::check_version(&probe.version)?;

		Self::parse(path, &bytes)
	}

	fn parse<T>(path: &Path, bytes: &[u8]) -> Result<T, CacheError>
	where
		T: for<'de> Deserialize<'de>,
	{
		let deserializer = &mut serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(deserializer).map_err(|e| CacheError::Serialization {
			message: format!("Failed to parse {} at `{}`: {}", path.display(), e.path(), e.inner()),
		})
	}

	fn parent_dir(&self) -> Result<&Path, CacheError> {
		let parent = match self.path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent,
			_ => Path::new("."),
		};

		fs::create_dir_all(parent).map_err(|e| CacheError::Backend {
			message: format!("Failed to create cache directory {}: {e}", parent.display()),
		})?;

		Ok(parent)
	}

	fn persist(&self, document: &CacheDocument) -> Result<(), CacheError> {
		let parent = self.parent_dir()?;
		let serialized =
			serde_json::to_vec_pretty(document).map_err(|e| CacheError::Serialization {
				message: format!("Failed to serialize token cache: {e}"),
			})?;
		let mut tmp = NamedTempFile::new_in(parent).map_err(|e| CacheError::Backend {
			message: format!("Failed to create a temporary file in {}: {e}", parent.display()),
		})?;

		tmp.write_all(&serialized).map_err(|e| CacheError::Backend {
			message: format!("Failed to write {}: {e}", tmp.path().display()),
		})?;
		tmp.as_file().sync_all().map_err(|e| CacheError::Backend {
			message: format!("Failed to sync {}: {e}", tmp.path().display()),
		})?;

		Self::restrict_permissions(tmp.path())?;

		// A failed persist drops the temporary, which deletes it.
		tmp.persist(&self.path).map_err(|e| CacheError::Backend {
			message: format!("Failed to replace {}: {}", self.path.display(), e.error),
		})?;

		Ok(())
	}

	#[cfg(unix)]
	fn restrict_permissions(path: &Path) -> Result<(), CacheError> {
		use std::os::unix::fs::PermissionsExt;

		fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
			CacheError::Backend {
				message: format!("Failed to restrict permissions on {}: {e}", path.display()),
			}
		})
	}

	#[cfg(not(unix))]
	fn restrict_permissions(_path: &Path) -> Result<(), CacheError> {
		Ok(())
	}

	fn mutate<T>(&self, f: impl FnOnce(&mut CacheDocument) -> T) -> Result<T, CacheError> {
		let _guard = self.write_lock.lock();
		let mut document = Self::read_document(&self.path)?;
		let output = f(&mut document);

		self.persist(&document)?;

		Ok(output)
	}
}
impl TokenCache for FileCache {
	fn load<'a>(&'a self, host: &'a HostId) -> CacheFuture<'a, Vec<CacheRecord>> {
		Box::pin(async move { Ok(Self::read_document(&self.path)?.records(host)) })
	}

	fn save<'a>(&'a self, host: &'a HostId, record: CacheRecord) -> CacheFuture<'a, ()> {
		Box::pin(async move { self.mutate(|document| document.upsert(host, record)) })
	}

	fn remove<'a>(&'a self, host: &'a HostId, secret: &'a TokenSecret) -> CacheFuture<'a, bool> {
		Box::pin(async move { self.mutate(|document| document.remove(host, secret)) })
	}

	fn clear<'a>(&'a self, host: &'a HostId) -> CacheFuture<'a, usize> {
		Box::pin(async move { self.mutate(|document| document.clear(host)) })
	}
}
