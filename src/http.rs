//! Reqwest transport that runs every request through an [`Authenticator`].
//!
//! [`AuthenticatedClient::execute`] signs the request, sends it, feeds the status back through
//! [`Authenticator::on_response`], and on [`RetryDecision::Retry`] re-signs a copy and sends it
//! exactly once more. Redirects are not followed, so a signed request is never replayed against
//! another origin.

// std
use std::ops::Deref;
// crates.io
use reqwest::{Request, Response, redirect::Policy};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	authenticator::{Attempt, Authenticator, RetryDecision},
	error::{ConfigError, TransportError},
};

/// Reqwest client paired with an [`Authenticator`].
#[derive(Clone, Debug)]
pub struct AuthenticatedClient {
	client: ReqwestClient,
	authenticator: Arc<Authenticator>,
}
impl AuthenticatedClient {
	/// Builds a client with the crate's default reqwest settings.
	pub fn new(authenticator: Arc<Authenticator>) -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self::with_client(client, authenticator))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, authenticator: Arc<Authenticator>) -> Self {
		Self { client, authenticator }
	}

	/// The authenticator signing this client's requests.
	pub fn authenticator(&self) -> &Arc<Authenticator> {
		&self.authenticator
	}

	/// Sends `request` under the sign / inspect / retry-once protocol.
	///
	/// Requests whose body cannot be cloned (streams) are sent once; a `401` for them surfaces as
	/// [`Error::AuthenticationRejected`] after the token has been renegotiated for later calls.
	pub async fn execute(&self, request: Request) -> Result<Response> {
		let retry = request.try_clone();
		let (response, signed_with) = self.send(request).await?;
		let decision = self
			.authenticator
			.on_response(Attempt::Initial, response.status().as_u16(), &signed_with)
			.await?;

		match decision {
			RetryDecision::Done => Ok(response),
			RetryDecision::Retry => {
				let Some(retry) = retry else {
					return Err(Error::AuthenticationRejected {
						host: self.authenticator.host().to_string(),
					});
				};
				let (response, signed_with) = self.send(retry).await?;

				self.authenticator
					.on_response(Attempt::Retry, response.status().as_u16(), &signed_with)
					.await?;

				Ok(response)
			},
		}
	}

	/// Convenience `GET` against a path below the authenticator's host.
	pub async fn get(&self, path: &str) -> Result<Response> {
		let url = self.authenticator.host().join(path).map_err(|source| {
			ConfigError::InvalidRequestPath { path: path.to_owned(), source }
		})?;
		let request = self.client.get(url).build().map_err(TransportError::from)?;

		self.execute(request).await
	}

	async fn send(&self, request: Request) -> Result<(Response, TokenSecret)> {
		let (request, signed_with) = self.authenticator.prepare_request(request)?.into_parts();
		let response = self.client.execute(request).await.map_err(TransportError::from)?;

		Ok((response, signed_with))
	}
}
impl Deref for AuthenticatedClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.client
	}
}
