#![cfg(feature = "reqwest")]

mod common;

// std
use std::{path::Path, sync::Arc};
// crates.io
use httpmock::prelude::*;
// self
use common::CountingAcquirer;
use dagshub_auth::{
	auth::{AppToken, HostId, TokenKind, TokenSecret},
	authenticator::Authenticator,
	cache::MemoryCache,
	error::{ConfigError, Error},
	http::AuthenticatedClient,
	select::Selector,
};

const USER_PATH: &str = "/api/v1/user";

async fn client_for(
	server: &MockServer,
	acquirer: Arc<CountingAcquirer>,
) -> (AuthenticatedClient, Arc<MemoryCache>, HostId) {
	client_under(&server.base_url(), acquirer).await
}

async fn client_under(
	origin: &str,
	acquirer: Arc<CountingAcquirer>,
) -> (AuthenticatedClient, Arc<MemoryCache>, HostId) {
	let host = common::host(origin);
	let seeded = AppToken::new(TokenSecret::new("old")).serialize().expect("App serializes.");
	let cache = Arc::new(MemoryCache::with_records(&host, [seeded]));
	let config = common::config(origin, Path::new("unused-cache"), None);
	let selector =
		Arc::new(Selector::new(Arc::new(config), cache.clone()).with_acquirer(acquirer));
	let authenticator = Authenticator::bind(selector, host.clone())
		.await
		.expect("Binding the seeded app token should succeed.");
	let client = AuthenticatedClient::new(Arc::new(authenticator))
		.expect("Building the HTTP client should succeed.");

	(client, cache, host)
}

#[tokio::test]
async fn accepted_request_is_sent_once() {
	let server = MockServer::start_async().await;
	let acquirer = CountingAcquirer::granting("fresh");
	let (client, _cache, _host) = client_for(&server, acquirer.clone()).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(USER_PATH).header("authorization", "Bearer old");
			then.status(200).header("content-type", "application/json").body(r#"{"id":1}"#);
		})
		.await;
	let response = client.get(USER_PATH).await.expect("Request should succeed.");

	assert_eq!(response.status().as_u16(), 200);
	mock.assert_async().await;
	assert_eq!(acquirer.calls(), 0);
}

#[tokio::test]
async fn unauthorized_token_is_renegotiated_and_retried_once() {
	let server = MockServer::start_async().await;
	let acquirer = CountingAcquirer::granting("fresh");
	let (client, cache, host) = client_for(&server, acquirer.clone()).await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path(USER_PATH).header("authorization", "Bearer old");
			then.status(401);
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path(USER_PATH).header("authorization", "Bearer fresh");
			then.status(200).header("content-type", "application/json").body(r#"{"id":1}"#);
		})
		.await;
	let response = client.get(USER_PATH).await.expect("Retried request should succeed.");

	assert_eq!(response.status().as_u16(), 200);
	rejected.assert_async().await;
	accepted.assert_async().await;
	assert_eq!(acquirer.calls(), 1);

	let bound = client.authenticator().token();

	assert_eq!(bound.kind(), TokenKind::OAuth);
	assert_eq!(bound.token_text(), "fresh");

	let records = cache.snapshot().records(&host);

	assert_eq!(records.len(), 1, "The rejected app token should be evicted: {records:?}.");
	assert_eq!(records[0].access_token.expose(), "fresh");

	let response = client.get(USER_PATH).await.expect("Follow-up request should succeed.");

	assert_eq!(response.status().as_u16(), 200);
	assert_eq!(accepted.hits_async().await, 2);
	assert_eq!(acquirer.calls(), 1, "The renegotiated token should stay bound.");
}

#[tokio::test]
async fn second_unauthorized_is_terminal() {
	let server = MockServer::start_async().await;
	let acquirer = CountingAcquirer::granting("fresh");
	let (client, _cache, _host) = client_for(&server, acquirer.clone()).await;
	let unauthorized = server
		.mock_async(|when, then| {
			when.method(GET).path(USER_PATH);
			then.status(401);
		})
		.await;
	let err = client.get(USER_PATH).await.expect_err("A second 401 must not be retried.");

	assert!(matches!(err, Error::AuthenticationRejected { .. }), "Unexpected error: {err:?}.");
	assert_eq!(unauthorized.hits_async().await, 2);
	assert_eq!(acquirer.calls(), 1);
}

#[tokio::test]
async fn renegotiation_failure_surfaces_the_acquisition_error() {
	let server = MockServer::start_async().await;
	let acquirer = CountingAcquirer::cancelling();
	let (client, _cache, _host) = client_for(&server, acquirer.clone()).await;
	let unauthorized = server
		.mock_async(|when, then| {
			when.method(GET).path(USER_PATH);
			then.status(401);
		})
		.await;
	let err = client.get(USER_PATH).await.expect_err("Cancelled renegotiation should fail.");

	assert!(matches!(err, Error::NoUsableCredential { source: Some(_), .. }));
	assert_eq!(unauthorized.hits_async().await, 1);
	assert_eq!(client.authenticator().token_text().expose(), "old");
}

#[tokio::test]
async fn paths_resolve_below_a_prefixed_host() {
	let server = MockServer::start_async().await;
	let acquirer = CountingAcquirer::granting("fresh");
	let (client, _cache, _host) =
		client_under(&format!("{}/dagshub", server.base_url()), acquirer).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/dagshub/api/v1/user").header("authorization", "Bearer old");
			then.status(200);
		})
		.await;
	let response = client.get(USER_PATH).await.expect("Request should succeed.");

	assert_eq!(response.status().as_u16(), 200);
	mock.assert_async().await;
}

#[tokio::test]
async fn unresolvable_paths_are_configuration_errors() {
	let server = MockServer::start_async().await;
	let (client, _cache, _host) = client_for(&server, CountingAcquirer::granting("fresh")).await;
	let err = client.get("http://[not-an-address").await.expect_err("The path cannot resolve.");

	assert!(
		matches!(err, Error::Config(ConfigError::InvalidRequestPath { .. })),
		"Unexpected error: {err:?}."
	);
}
