//! Validated host identifiers used as cache keys and token bindings.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

/// Absolute `http`/`https` origin of the remote service, e.g. `https://dagshub.com`.
///
/// Trailing slashes are trimmed so equivalent spellings share one cache key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostId(String);
impl HostId {
	/// Creates a new host after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, HostError> {
		let view = value.as_ref().trim_end_matches('/');

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Builds a host from a bare host name or a full origin.
	///
	/// `dagshub.com` becomes `https://dagshub.com`; values that already carry a scheme are kept.
	pub fn from_hostname(value: impl AsRef<str>) -> Result<Self, HostError> {
		let view = value.as_ref();

		if view.contains("://") { Self::new(view) } else { Self::new(format!("https://{view}")) }
	}

	/// Resolves `path` below this host, keeping any base path the host carries.
	///
	/// `https://example.com/dagshub` joined with `/api/v1/user` yields
	/// `https://example.com/dagshub/api/v1/user`.
	pub fn join(&self, path: &str) -> Result<Url, url::ParseError> {
		Url::parse(&format!("{}/", self.0))?.join(path.trim_start_matches('/'))
	}
}
impl Deref for HostId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for HostId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for HostId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<HostId> for String {
	fn from(value: HostId) -> Self {
		value.0
	}
}
impl TryFrom<String> for HostId {
	type Error = HostError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for HostId {
	type Err = HostError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for HostId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Host({})", self.0)
	}
}
impl Display for HostId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Error returned when host validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum HostError {
	/// The host was empty.
	#[error("Host cannot be empty.")]
	Empty,
	/// The host contains whitespace characters.
	#[error("Host contains whitespace.")]
	ContainsWhitespace,
	/// The host is not an absolute URL.
	#[error("Host is not an absolute URL.")]
	NotAUrl(#[from] url::ParseError),
	/// The host uses a scheme other than http or https.
	#[error("Host scheme `{scheme}` is not http or https.")]
	UnsupportedScheme {
		/// Rejected scheme.
		scheme: String,
	},
}

fn validate_view(view: &str) -> Result<(), HostError> {
	if view.is_empty() {
		return Err(HostError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(HostError::ContainsWhitespace);
	}

	let url = Url::parse(view)?;

	match url.scheme() {
		"http" | "https" => Ok(()),
		scheme => Err(HostError::UnsupportedScheme { scheme: scheme.into() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn trailing_slash_is_trimmed() {
		let a = HostId::new("https://dagshub.com/").expect("Host with slash should be valid.");
		let b = HostId::new("https://dagshub.com").expect("Host without slash should be valid.");

		assert_eq!(a, b);
		assert_eq!(a.as_ref(), "https://dagshub.com");
	}

	#[test]
	fn invalid_hosts_are_rejected() {
		assert_eq!(HostId::new(""), Err(HostError::Empty));
		assert_eq!(HostId::new("https://dags hub.com"), Err(HostError::ContainsWhitespace));
		assert!(matches!(HostId::new("dagshub.com"), Err(HostError::NotAUrl(_))));
		assert!(matches!(
			HostId::new("ftp://dagshub.com"),
			Err(HostError::UnsupportedScheme { .. })
		));
	}

	#[test]
	fn bare_hostnames_default_to_https() {
		let host = HostId::from_hostname("dagshub.com").expect("Bare host name should be valid.");

		assert_eq!(host.as_ref(), "https://dagshub.com");

		let explicit = HostId::from_hostname("http://localhost:3000")
			.expect("Explicit origin should be kept.");

		assert_eq!(explicit.as_ref(), "http://localhost:3000");
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let host: HostId = serde_json::from_str("\"https://dagshub.com/\"")
			.expect("Host should deserialize successfully.");

		assert_eq!(
			serde_json::to_string(&host).expect("Host should serialize."),
			"\"https://dagshub.com\""
		);
		assert!(serde_json::from_str::<HostId>("\"not a host\"").is_err());
	}

	#[test]
	fn join_keeps_the_base_path() {
		let root = HostId::new("https://dagshub.com").expect("Host fixture should be valid.");
		let prefixed =
			HostId::new("https://example.com/dagshub/").expect("Host fixture should be valid.");

		assert_eq!(
			root.join("/api/v1/user").expect("Path should join.").as_str(),
			"https://dagshub.com/api/v1/user"
		);
		assert_eq!(
			prefixed.join("/api/v1/user").expect("Path should join.").as_str(),
			"https://example.com/dagshub/api/v1/user"
		);
		assert_eq!(
			prefixed.join("api/v1/user").expect("Path should join.").as_str(),
			"https://example.com/dagshub/api/v1/user"
		);
	}
}
