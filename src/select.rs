//! Credential selection: cached and environment candidates in, exactly one usable token out.
//!
//! [`Selector::select`] loads the host's cache records, rebuilds them into [`Token`]s (a corrupt
//! record fails the whole call), adds the environment token when it is bound to the requested
//! host, drops expired tokens (evicting them from the cache), and returns the lowest-priority
//! survivor. Ties go to the most recently cached record. On a miss the configured
//! [`TokenAcquirer`] runs exactly once and its result is persisted and returned; a stale token is
//! never refreshed in place.
//!
//! The load/acquire/save sequence runs under one async mutex per selector, so concurrent callers
//! in the same process never race each other into a second interactive login.

mod metrics;

pub use metrics::AcquisitionMetrics;

// self
use crate::{
	_prelude::*,
	acquire::{AcquireError, TokenAcquirer},
	auth::{AppToken, EnvVarToken, HostId, OAuthToken, Token, TokenSecret},
	cache::TokenCache,
	config::AuthConfig,
	obs::{self, AuthFlow, FlowOutcome, FlowSpan},
};

/// One selectable token plus its cache position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
	/// The token.
	pub token: Token,
	/// Position in the host's cache list; higher means more recently cached.
	pub recency: usize,
}
impl Candidate {
	/// Wraps a token discovered at cache position `recency`.
	pub fn new(token: Token, recency: usize) -> Self {
		Self { token, recency }
	}
}

/// Picks the usable candidate with the lowest priority at `now`.
///
/// Expired candidates are discarded first. Among equal priorities the highest `recency` wins, so
/// the outcome never depends on iteration order.
pub fn pick(
	candidates: impl IntoIterator<Item = Candidate>,
	now: OffsetDateTime,
) -> Option<Token> {
	candidates
		.into_iter()
		.filter(|candidate| !candidate.token.is_expired_at(now))
		.min_by(|a, b| {
			a.token.priority().cmp(&b.token.priority()).then_with(|| b.recency.cmp(&a.recency))
		})
		.map(|candidate| candidate.token)
}

/// Resolves the token to use for a host.
pub struct Selector {
	config: Arc<AuthConfig>,
	cache: Arc<dyn TokenCache>,
	acquirer: Option<Arc<dyn TokenAcquirer>>,
	metrics: Arc<AcquisitionMetrics>,
	guard: AsyncMutex<()>,
}
impl Selector {
	/// Creates a selector without an acquirer; misses fail with
	/// [`Error::NoUsableCredential`].
	pub fn new(config: Arc<AuthConfig>, cache: Arc<dyn TokenCache>) -> Self {
		Self {
			config,
			cache,
			acquirer: None,
			metrics: Default::default(),
			guard: AsyncMutex::new(()),
		}
	}

	/// Installs the acquisition flow invoked on a miss.
	pub fn with_acquirer(mut self, acquirer: Arc<dyn TokenAcquirer>) -> Self {
		self.acquirer = Some(acquirer);

		self
	}

	/// Configuration the selector was built with.
	pub fn config(&self) -> &AuthConfig {
		&self.config
	}

	/// Acquisition counters.
	pub fn metrics(&self) -> &AcquisitionMetrics {
		&self.metrics
	}

	/// Selects the token for `host`, acquiring a fresh one on a miss.
	pub async fn select(&self, host: &HostId) -> Result<Token> {
		const FLOW: AuthFlow = AuthFlow::Selection;

		obs::record_flow_outcome(FLOW, FlowOutcome::Attempt);

		let result = FlowSpan::new(FLOW, "select", host)
			.instrument(async {
				let _sequence = self.guard.lock().await;

				self.select_locked(host, None).await
			})
			.await;

		obs::record_flow_result(FLOW, &result);

		result
	}

	/// Selects the token for the configured default host.
	pub async fn select_default(&self) -> Result<Token> {
		self.select(&self.config.host).await
	}

	/// Replaces a token the host rejected.
	///
	/// `rejected` is evicted from the cache (when it was cached) and excluded from the candidate
	/// set, then selection runs again; with nothing else usable this forces acquisition.
	pub async fn reselect(&self, host: &HostId, rejected: &Token) -> Result<Token> {
		const FLOW: AuthFlow = AuthFlow::Renegotiation;

		obs::record_flow_outcome(FLOW, FlowOutcome::Attempt);

		let result = FlowSpan::new(FLOW, "reselect", host)
			.instrument(async {
				let _sequence = self.guard.lock().await;

				if rejected.is_persistable() {
					self.cache.remove(host, rejected.secret()).await?;
				}

				self.select_locked(host, Some(rejected.secret())).await
			})
			.await;

		obs::record_flow_result(FLOW, &result);

		result
	}

	/// Secret of the selected token for `host`.
	pub async fn get_token(&self, host: &HostId) -> Result<TokenSecret> {
		Ok(self.select(host).await?.secret().clone())
	}

	/// Current candidates for `host`: cached tokens in cache order, then the environment token.
	///
	/// Expired tokens are included; corrupt records fail the call.
	pub async fn candidates(&self, host: &HostId) -> Result<Vec<Candidate>> {
		let mut candidates = self.cached_candidates(host).await?;

		candidates.extend(self.env_candidate(host));

		Ok(candidates)
	}

	/// Stores a user-supplied app token for `host`.
	pub async fn add_app_token(
		&self,
		host: &HostId,
		secret: impl Into<String>,
	) -> Result<AppToken> {
		let token = AppToken::new(TokenSecret::new(secret));
		let _sequence = self.guard.lock().await;

		self.cache.save(host, token.serialize()?).await?;

		Ok(token)
	}

	/// Runs acquisition unconditionally and stores the resulting OAuth token.
	pub async fn login(&self, host: &HostId) -> Result<OAuthToken> {
		let _sequence = self.guard.lock().await;

		self.acquire_locked(host).await
	}

	/// Evicts every cached token for `host`, returning how many were removed.
	pub async fn logout(&self, host: &HostId) -> Result<usize> {
		let _sequence = self.guard.lock().await;

		Ok(self.cache.clear(host).await?)
	}

	async fn select_locked(&self, host: &HostId, exclude: Option<&TokenSecret>) -> Result<Token> {
		let now = OffsetDateTime::now_utc();
		let cached = self.cached_candidates(host).await?;
		let (expired, live): (Vec<_>, Vec<_>) =
			cached.into_iter().partition(|candidate| candidate.token.is_expired_at(now));

		if !expired.is_empty() {
			let mut evicted = 0;

			// Eviction is housekeeping; a read-only cache must not hide a usable token.
			for candidate in &expired {
				match self.cache.remove(host, candidate.token.secret()).await {
					Ok(_) => evicted += 1,
					Err(e) => obs::warn("failed to evict an expired token", host, &e),
				}
			}

			obs::note("evicted expired tokens", host, evicted);
		}

		let candidates = live
			.into_iter()
			.chain(self.env_candidate(host))
			.filter(|candidate| exclude.is_none_or(|secret| candidate.token.secret() != secret));

		if let Some(token) = pick(candidates, now) {
			return Ok(token);
		}

		Ok(self.acquire_locked(host).await?.into())
	}

	async fn acquire_locked(&self, host: &HostId) -> Result<OAuthToken> {
		const FLOW: AuthFlow = AuthFlow::Acquisition;

		let Some(acquirer) = self.acquirer.as_ref() else {
			return Err(Error::NoUsableCredential { host: host.to_string(), source: None });
		};

		obs::record_flow_outcome(FLOW, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		let result = FlowSpan::new(FLOW, "acquire", host)
			.instrument(async {
				let acquired = acquirer.acquire(host).await.map_err(|e| {
					Error::NoUsableCredential { host: host.to_string(), source: Some(e) }
				})?;
				let token = OAuthToken::from(acquired);

				if token.is_expired_at(OffsetDateTime::now_utc()) {
					return Err(Error::NoUsableCredential {
						host: host.to_string(),
						source: Some(AcquireError::failed("the issued token has already expired")),
					});
				}

				self.cache.save(host, token.serialize()?).await?;

				Ok(token)
			})
			.await;

		match &result {
			Ok(_) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		obs::record_flow_result(FLOW, &result);

		result
	}

	async fn cached_candidates(&self, host: &HostId) -> Result<Vec<Candidate>> {
		let records = self.cache.load(host).await?;
		let mut candidates = Vec::with_capacity(records.len());

		for (recency, record) in records.iter().enumerate() {
			candidates.push(Candidate::new(Token::deserialize(record)?, recency));
		}

		Ok(candidates)
	}

	fn env_candidate(&self, host: &HostId) -> Option<Candidate> {
		let secret = self.config.env_token.as_ref()?;

		if host != &self.config.host {
			return None;
		}

		let token = EnvVarToken::new(secret.clone(), self.config.host.clone());

		Some(Candidate::new(token.into(), usize::MAX))
	}
}
impl Debug for Selector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Selector")
			.field("config", &self.config)
			.field("acquirer_set", &self.acquirer.is_some())
			.field("metrics", &self.metrics)
			.finish()
	}
}
