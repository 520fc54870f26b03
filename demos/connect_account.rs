//! Walks through the full account-connect handshake against a mock provider:
//! state issuance, callback completion, and the credential liveness probe.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use connect_broker::{
	auth::{ProviderId, ScopeSet, UserId},
	flows::Authorizer,
	provider::{GraphClient, ProviderConfig},
	reqwest::Client,
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"short-lived\"}");
		})
		.await;
	let upgrade_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/access_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"long-lived\",\"refresh_token\":\"refresh-1\",\"expires_in\":5184000}",
			);
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"42\",\"username\":\"demo_user\",\"account_type\":\"PERSONAL\"}");
		})
		.await;
	let config = ProviderConfig::builder()
		.client_id("demo-app")
		.client_secret("demo-secret")
		.redirect_uri(Url::parse("https://app.example.com/callback")?)
		.authorize_endpoint(Url::parse(&server.url("/oauth/authorize"))?)
		.token_endpoint(Url::parse(&server.url("/oauth/access_token"))?)
		.graph_endpoint(Url::parse(&server.url("/v1"))?)
		.build()?;
	let client = GraphClient::with_client(
		config,
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let store = Arc::new(MemoryStore::default());
	let authorizer = Authorizer::new(
		ProviderId::new("media-provider")?,
		ScopeSet::new(["user_media", "user_profile"])?,
		Arc::new(client),
		store.clone(),
		store.clone(),
	);
	let user = UserId::new("user-123")?;
	let redirect = authorizer.start_authorization(&user, Some("setup")).await?;

	println!("Send your user to {redirect}.");

	// Simulate the provider redirecting back with the state it was handed.
	let state = redirect
		.query_pairs()
		.find_map(|(key, value)| (key == "state").then(|| value.into_owned()))
		.unwrap_or_default();
	let record = authorizer.complete_authorization(&user, &state, "demo-code").await?;

	println!("Connected owner {} ({}).", record.owner.username, record.owner.id);
	println!("Authorized: {}.", authorizer.is_authorized(&user).await?);

	if let Some(source) = authorizer.authorization_source(&state) {
		println!("Post-callback redirect source: {source}.");
	}

	token_mock.assert_async().await;
	upgrade_mock.assert_async().await;
	profile_mock.assert_async().await;

	Ok(())
}
