#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use connect_broker::{
	_preludet::*,
	auth::{Account, OwnerId, OwnerProfile, ProviderId, TokenPayload, TokenRecord, UserId},
	provider::ProviderConfig,
	store::{CredentialStore, MemoryStore},
};

fn build_config(server: &MockServer) -> ProviderConfig {
	let parse = |path: &str| {
		Url::parse(&server.url(path)).expect("Mock endpoint URL should parse successfully.")
	};

	ProviderConfig::builder()
		.client_id("app-123")
		.client_secret("app-secret")
		.redirect_uri(
			Url::parse("https://app.example.com/callback")
				.expect("Redirect URI fixture should parse successfully."),
		)
		.authorize_endpoint(parse("/oauth/authorize"))
		.token_endpoint(parse("/oauth/access_token"))
		.graph_endpoint(parse("/v1"))
		.build()
		.expect("Provider config fixture should validate.")
}

fn make_user(id: &str) -> UserId {
	UserId::new(id).expect("User identifier should be valid for refresh tests.")
}

fn make_account(user: &UserId) -> Account {
	Account::new(
		user.clone(),
		ProviderId::new("media-provider")
			.expect("Provider identifier should match the test authorizer."),
	)
}

async fn seed_record(
	store: &MemoryStore,
	user: &UserId,
	refresh: Option<&str>,
	expires_at: Option<OffsetDateTime>,
) {
	let owner = OwnerProfile::new(
		OwnerId::new(42).expect("Owner identifier fixture should be valid."),
		"analogue",
	);
	let mut payload = TokenPayload::new("stale-access");

	if let Some(refresh) = refresh {
		payload = payload.with_refresh_token(refresh);
	}
	if let Some(expires_at) = expires_at {
		payload = payload.with_expires_at(expires_at);
	}

	let issued = OffsetDateTime::now_utc() - Duration::hours(1);
	let record = TokenRecord::issued(make_account(user), owner, payload, issued);

	store.save(record).await.expect("Seeding the refresh record should succeed.");
}

#[tokio::test]
async fn expired_record_refreshes_in_place() {
	let server = MockServer::start_async().await;
	let (authorizer, store) = build_test_authorizer(build_config(&server));
	let user = make_user("user-1");

	seed_record(
		&store,
		&user,
		Some("rotate-me"),
		Some(OffsetDateTime::now_utc() - Duration::minutes(5)),
	)
	.await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"fresh-access\",\"refresh_token\":\"rotate-me-next\",\"expires_in\":5184000}",
			);
		})
		.await;
	let authorized =
		authorizer.is_authorized(&user).await.expect("The liveness probe should succeed.");

	refresh_mock.assert_async().await;

	assert!(authorized, "A successful refresh must leave the account authorized.");

	let stored = store
		.fetch(&make_account(&user))
		.await
		.expect("Fetching the refreshed credential should succeed.")
		.expect("The refreshed credential should remain stored.");

	assert_eq!(stored.access_token.expose(), "fresh-access");
	assert_eq!(
		stored.refresh_token.as_ref().map(|secret| secret.expose()),
		Some("rotate-me-next"),
	);
	assert!(!stored.is_expired());
	assert_eq!(authorizer.refresh_metrics.attempts(), 1);
	assert_eq!(authorizer.refresh_metrics.successes(), 1);
	assert_eq!(authorizer.refresh_metrics.revocations(), 0);
}

#[tokio::test]
async fn rejected_refresh_fails_closed() {
	let server = MockServer::start_async().await;
	let (authorizer, store) = build_test_authorizer(build_config(&server));
	let user = make_user("user-1");

	seed_record(
		&store,
		&user,
		Some("rotate-me"),
		Some(OffsetDateTime::now_utc() - Duration::minutes(5)),
	)
	.await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error_message\":\"refresh token revoked\"}");
		})
		.await;
	let authorized =
		authorizer.is_authorized(&user).await.expect("The liveness probe should succeed.");

	refresh_mock.assert_async().await;

	assert!(!authorized, "A rejected refresh must leave the account unauthorized.");

	let stored = store
		.fetch(&make_account(&user))
		.await
		.expect("Fetching after the failed refresh should succeed.");

	assert_eq!(stored, None, "A credential the provider rejected must be deleted.");
	assert_eq!(authorizer.refresh_metrics.attempts(), 1);
	assert_eq!(authorizer.refresh_metrics.failures(), 1);
	assert_eq!(authorizer.refresh_metrics.revocations(), 1);
}

#[tokio::test]
async fn expired_record_without_refresh_token_fails_closed() {
	let server = MockServer::start_async().await;
	let (authorizer, store) = build_test_authorizer(build_config(&server));
	let user = make_user("user-1");

	seed_record(&store, &user, None, Some(OffsetDateTime::now_utc() - Duration::minutes(5)))
		.await;

	let authorized =
		authorizer.is_authorized(&user).await.expect("The liveness probe should succeed.");

	assert!(!authorized);

	let stored = store
		.fetch(&make_account(&user))
		.await
		.expect("Fetching after the failed refresh should succeed.");

	assert_eq!(stored, None, "An unrefreshable expired credential must be deleted.");
	assert_eq!(authorizer.refresh_metrics.revocations(), 1);
}

#[tokio::test]
async fn non_expiring_record_never_hits_the_provider() {
	let server = MockServer::start_async().await;
	let (authorizer, store) = build_test_authorizer(build_config(&server));
	let user = make_user("user-1");

	// No mocks are installed; any provider call would fail the probe.
	seed_record(&store, &user, None, None).await;

	let authorized =
		authorizer.is_authorized(&user).await.expect("The liveness probe should succeed.");

	assert!(authorized, "A non-expiring credential must stay authorized without a refresh.");
	assert_eq!(authorizer.refresh_metrics.attempts(), 0);
}

#[tokio::test]
async fn absent_record_reads_as_unauthorized() {
	let server = MockServer::start_async().await;
	let (authorizer, _store) = build_test_authorizer(build_config(&server));
	let authorized = authorizer
		.is_authorized(&make_user("user-1"))
		.await
		.expect("The liveness probe should succeed.");

	assert!(!authorized);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_probes_refresh_once() {
	let server = MockServer::start_async().await;
	let (authorizer, store) = build_test_authorizer(build_config(&server));
	let user = make_user("user-1");

	seed_record(
		&store,
		&user,
		Some("rotate-me"),
		Some(OffsetDateTime::now_utc() - Duration::minutes(5)),
	)
	.await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh-access\",\"expires_in\":5184000}");
		})
		.await;
	let mut handles = Vec::new();

	for _ in 0..4 {
		let authorizer = authorizer.clone();
		let user = user.clone();

		handles.push(tokio::spawn(async move { authorizer.is_authorized(&user).await }));
	}

	for handle in handles {
		let authorized = handle
			.await
			.expect("Probe task should not panic.")
			.expect("The liveness probe should succeed.");

		assert!(authorized);
	}

	// The singleflight guard lets the first probe refresh and the rest reuse
	// its result.
	refresh_mock.assert_hits_async(1).await;
	assert_eq!(authorizer.refresh_metrics.attempts(), 1);
}
