//! Request signing contract that lets any HTTP client carry a bearer credential.
//!
//! Signing is a pure in-memory mutation: it sets one header and never touches the network.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// An outbound request (or header set) that can carry an `Authorization` header.
///
/// Implementations must overwrite an existing header rather than append a second one.
pub trait Signable
where
	Self: Sized,
{
	/// Sets the `Authorization` header to `value`, replacing any previous value.
	fn set_authorization(&mut self, value: &str) -> Result<()>;
}

#[cfg(feature = "reqwest")]
impl Signable for reqwest::header::HeaderMap {
	fn set_authorization(&mut self, value: &str) -> Result<()> {
		let mut header =
			reqwest::header::HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader)?;

		header.set_sensitive(true);
		self.insert(reqwest::header::AUTHORIZATION, header);

		Ok(())
	}
}
#[cfg(feature = "reqwest")]
impl Signable for reqwest::Request {
	fn set_authorization(&mut self, value: &str) -> Result<()> {
		self.headers_mut().set_authorization(value)
	}
}

/// Sets `Authorization: Bearer <secret>` on `request` and hands it back.
pub fn attach_bearer<R>(mut request: R, secret: &TokenSecret) -> Result<R>
where
	R: Signable,
{
	request.set_authorization(&secret.bearer_header())?;

	Ok(request)
}

/// Signs requests with one fixed bearer secret, bypassing selection entirely.
///
/// Useful for callers that were handed an explicit token (for example on the command line).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BearerAuth(TokenSecret);
impl BearerAuth {
	/// Wraps the provided secret.
	pub fn new(secret: impl Into<String>) -> Self {
		Self(TokenSecret::new(secret))
	}

	/// The wrapped secret.
	pub fn secret(&self) -> &TokenSecret {
		&self.0
	}

	/// Sets `Authorization: Bearer <secret>` on the request.
	pub fn sign<R>(&self, request: R) -> Result<R>
	where
		R: Signable,
	{
		attach_bearer(request, &self.0)
	}
}
