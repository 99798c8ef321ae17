//! Binds one selected token to a client's outbound requests.
//!
//! The protocol is two explicit calls per request, made by the transport:
//!
//! 1. [`Authenticator::prepare_request`] before sending, which signs the request with the bound
//!    token and remembers which secret it used.
//! 2. [`Authenticator::on_response`] once the status is known, which returns a
//!    [`RetryDecision`].
//!
//! A `401` on the [`Attempt::Initial`] send renegotiates the token through
//! [`Selector::reselect`] and asks for exactly one retry; a `401` on the [`Attempt::Retry`] send
//! is terminal. Renegotiation only replaces the token that actually signed the rejected request:
//! when several in-flight requests come back `401` for the same token, the first one swaps in a
//! replacement and the rest retry with it. The bound token is only swapped after renegotiation
//! succeeds, so an abandoned or failed request never leaves it half-updated.

// self
use crate::{
	_prelude::*,
	auth::{HostId, Token, TokenSecret},
	select::Selector,
	sign::Signable,
};

/// HTTP status that triggers renegotiation.
pub const UNAUTHORIZED: u16 = 401;

/// Which send of a request a response belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
	/// First send.
	Initial,
	/// The single retry after renegotiation.
	Retry,
}

/// What the transport should do after [`Authenticator::on_response`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
	/// Hand the response to the caller.
	Done,
	/// Re-sign the request with [`Authenticator::prepare_request`] and send it once more.
	Retry,
}

/// A request signed by [`Authenticator::prepare_request`].
///
/// Keep [`signed_with`](Self::signed_with) until the response arrives and hand it to
/// [`Authenticator::on_response`].
#[derive(Debug)]
pub struct SignedRequest<R> {
	request: R,
	signed_with: TokenSecret,
}
impl<R> SignedRequest<R> {
	/// The signed request.
	pub fn request(&self) -> &R {
		&self.request
	}

	/// Secret placed in the `Authorization` header.
	pub fn signed_with(&self) -> &TokenSecret {
		&self.signed_with
	}

	/// Splits into the request and the secret that signed it.
	pub fn into_parts(self) -> (R, TokenSecret) {
		(self.request, self.signed_with)
	}
}

/// Per-client request authenticator.
///
/// The token is selected once at [`bind`](Self::bind) time and reused for every request until a
/// `401` invalidates it.
pub struct Authenticator {
	selector: Arc<Selector>,
	host: HostId,
	bound: RwLock<Token>,
	renegotiation: AsyncMutex<()>,
}
impl Authenticator {
	/// Selects a token for `host` and binds it.
	pub async fn bind(selector: Arc<Selector>, host: HostId) -> Result<Self> {
		let token = selector.select(&host).await?;

		Ok(Self::with_token(selector, host, token))
	}

	/// Binds a token for the selector's configured default host.
	pub async fn bind_default(selector: Arc<Selector>) -> Result<Self> {
		let host = selector.config().host.clone();

		Self::bind(selector, host).await
	}

	/// Binds an already selected token.
	pub fn with_token(selector: Arc<Selector>, host: HostId, token: Token) -> Self {
		Self { selector, host, bound: RwLock::new(token), renegotiation: AsyncMutex::new(()) }
	}

	/// Host this authenticator signs for.
	pub fn host(&self) -> &HostId {
		&self.host
	}

	/// Copy of the bound token.
	pub fn token(&self) -> Token {
		self.bound.read().clone()
	}

	/// Secret of the bound token. Never log it.
	pub fn token_text(&self) -> TokenSecret {
		self.bound.read().secret().clone()
	}

	/// Phase 1: sign `request` with the bound token.
	pub fn prepare_request<R>(&self, request: R) -> Result<SignedRequest<R>>
	where
		R: Signable,
	{
		let token = self.token();
		let request = token.sign(request)?;

		Ok(SignedRequest { request, signed_with: token.secret().clone() })
	}

	/// Phase 2: inspect the response status of `attempt`, which was signed with `signed_with`.
	pub async fn on_response(
		&self,
		attempt: Attempt,
		status: u16,
		signed_with: &TokenSecret,
	) -> Result<RetryDecision> {
		if status != UNAUTHORIZED {
			return Ok(RetryDecision::Done);
		}

		match attempt {
			Attempt::Initial => {
				self.renegotiate(signed_with).await?;

				Ok(RetryDecision::Retry)
			},
			Attempt::Retry => Err(Error::AuthenticationRejected { host: self.host.to_string() }),
		}
	}

	/// Drops the bound token and binds a freshly selected replacement.
	pub async fn invalidate(&self) -> Result<Token> {
		let rejected = self.token_text();

		self.renegotiate(&rejected).await
	}

	async fn renegotiate(&self, rejected: &TokenSecret) -> Result<Token> {
		let _single = self.renegotiation.lock().await;
		let bound = self.token();

		// Another request already replaced the rejected token.
		if bound.secret() != rejected {
			return Ok(bound);
		}

		let replacement = self.selector.reselect(&self.host, &bound).await?;

		*self.bound.write() = replacement.clone();

		Ok(replacement)
	}
}
impl Debug for Authenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("host", &self.host)
			.field("token", &self.bound.read().kind())
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use reqwest::header::{AUTHORIZATION, HeaderMap};
	// self
	use super::*;
	use crate::{
		_preludet::*,
		acquire::TokenAcquirer,
		auth::{AppToken, TokenKind},
		cache::{MemoryCache, TokenCache},
	};

	fn header(signed: &SignedRequest<HeaderMap>) -> &str {
		signed
			.request()
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.expect("Authorization header should be set.")
	}

	async fn bound(acquirer: Option<Arc<ScriptedAcquirer>>) -> (Authenticator, Arc<MemoryCache>) {
		let acquirer = acquirer.map(|acquirer| acquirer as Arc<dyn TokenAcquirer>);
		let (selector, cache) = memory_selector(test_config(), acquirer);

		cache
			.save(
				&test_host(),
				AppToken::new(TokenSecret::new("old")).serialize().expect("App serializes."),
			)
			.await
			.expect("Seeding the cache should succeed.");

		let auth = Authenticator::bind(Arc::new(selector), test_host())
			.await
			.expect("Binding should succeed.");

		(auth, cache)
	}

	#[tokio::test]
	async fn success_needs_no_retry() {
		let (auth, _cache) = bound(None).await;
		let signed = auth.prepare_request(HeaderMap::new()).expect("Signing should succeed.");

		assert_eq!(header(&signed), "Bearer old");
		assert_eq!(signed.signed_with().expose(), "old");
		assert_eq!(
			auth.on_response(Attempt::Initial, 200, signed.signed_with())
				.await
				.expect("200 should be accepted."),
			RetryDecision::Done
		);
		assert_eq!(auth.token().kind(), TokenKind::App);
	}

	#[tokio::test]
	async fn unauthorized_renegotiates_once() {
		let acquirer = Arc::new(ScriptedAcquirer::granting("fresh"));
		let (auth, _cache) = bound(Some(acquirer.clone())).await;
		let first = auth.prepare_request(HeaderMap::new()).expect("Signing should succeed.");

		assert_eq!(
			auth.on_response(Attempt::Initial, UNAUTHORIZED, first.signed_with())
				.await
				.expect("First 401 should retry."),
			RetryDecision::Retry
		);
		assert_eq!(acquirer.calls(), 1);

		let retry = auth.prepare_request(HeaderMap::new()).expect("Re-signing should succeed.");

		assert_eq!(header(&retry), "Bearer fresh");

		let err = auth
			.on_response(Attempt::Retry, UNAUTHORIZED, retry.signed_with())
			.await
			.expect_err("Second 401 must be terminal.");

		assert!(matches!(err, Error::AuthenticationRejected { .. }));
		assert_eq!(acquirer.calls(), 1);
	}

	#[tokio::test]
	async fn late_rejection_of_a_replaced_token_reuses_the_replacement() {
		let acquirer = Arc::new(ScriptedAcquirer::granting("fresh"));
		let (auth, cache) = bound(Some(acquirer.clone())).await;
		let a = auth.prepare_request(HeaderMap::new()).expect("Signing A should succeed.");
		let b = auth.prepare_request(HeaderMap::new()).expect("Signing B should succeed.");

		assert_eq!(
			auth.on_response(Attempt::Initial, UNAUTHORIZED, a.signed_with())
				.await
				.expect("A's 401 should renegotiate."),
			RetryDecision::Retry
		);
		assert_eq!(
			auth.on_response(Attempt::Initial, UNAUTHORIZED, b.signed_with())
				.await
				.expect("B's 401 should retry with the replacement."),
			RetryDecision::Retry
		);
		assert_eq!(acquirer.calls(), 1);
		assert_eq!(auth.token_text().expose(), "fresh");

		let secrets = cache
			.snapshot()
			.records(&test_host())
			.into_iter()
			.map(|record| record.access_token.expose().to_owned())
			.collect::<Vec<_>>();

		assert_eq!(secrets, ["fresh"]);
	}

	#[tokio::test]
	async fn concurrent_rejections_acquire_once() {
		let acquirer = Arc::new(ScriptedAcquirer::granting("fresh"));
		let (auth, _cache) = bound(Some(acquirer.clone())).await;
		let a = auth.prepare_request(HeaderMap::new()).expect("Signing A should succeed.");
		let b = auth.prepare_request(HeaderMap::new()).expect("Signing B should succeed.");
		let (first, second) = tokio::join!(
			auth.on_response(Attempt::Initial, UNAUTHORIZED, a.signed_with()),
			auth.on_response(Attempt::Initial, UNAUTHORIZED, b.signed_with()),
		);

		assert_eq!(first.expect("A should retry."), RetryDecision::Retry);
		assert_eq!(second.expect("B should retry."), RetryDecision::Retry);
		assert_eq!(acquirer.calls(), 1);
	}

	#[tokio::test]
	async fn failed_renegotiation_keeps_bound_token() {
		let (auth, _cache) = bound(None).await;
		let signed = auth.prepare_request(HeaderMap::new()).expect("Signing should succeed.");
		let err = auth
			.on_response(Attempt::Initial, UNAUTHORIZED, signed.signed_with())
			.await
			.expect_err("Renegotiation without an acquirer must fail.");

		assert!(matches!(err, Error::NoUsableCredential { .. }));
		assert_eq!(auth.token_text().expose(), "old");
	}

	#[test]
	fn debug_omits_secret() {
		let (selector, _cache) = memory_selector(test_config(), None);
		let auth = Authenticator::with_token(
			Arc::new(selector),
			test_host(),
			AppToken::new(TokenSecret::new("hunter2")).into(),
		);

		assert!(!format!("{auth:?}").contains("hunter2"));
	}
}
