#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use connect_broker::{
	_preludet::*,
	auth::{
		Account, OwnerId, OwnerProfile, ProviderId, ScopeSet, TokenPayload, TokenRecord, UserId,
	},
	error::ConfigError,
	flows::Authorizer,
	provider::{MediaPage, MediaQuery, ProviderClient, ProviderConfig, ProviderFuture},
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
	UserId::new(id).expect("User identifier should be valid for media tests.")
}

fn make_account(user: &UserId) -> Account {
	Account::new(
		user.clone(),
		ProviderId::new("media-provider")
			.expect("Provider identifier should match the test authorizer."),
	)
}

async fn seed_record(store: &MemoryStore, user: &UserId) {
	let owner = OwnerProfile::new(
		OwnerId::new(42).expect("Owner identifier fixture should be valid."),
		"analogue",
	);
	let record =
		TokenRecord::new(make_account(user), owner, TokenPayload::new("long-lived"));

	store.save(record).await.expect("Seeding the media credential should succeed.");
}

#[tokio::test]
async fn listing_without_a_credential_is_rejected() {
	let server = MockServer::start_async().await;
	let (authorizer, _store) = build_test_authorizer(build_config(&server));
	let err = authorizer
		.media_list(&make_user("user-1"), MediaQuery::new())
		.await
		.expect_err("Listing media without a stored credential must fail.");

	assert!(matches!(err, Error::MissingToken));
}

#[tokio::test]
async fn page_flags_follow_the_provider_paging_links() {
	let server = MockServer::start_async().await;
	let (authorizer, store) = build_test_authorizer(build_config(&server));
	let user = make_user("user-1");

	seed_record(&store, &user).await;

	let media_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/me/media")
				.query_param("limit", "5")
				.query_param("after", "cursor-a")
				.query_param("access_token", "long-lived");
			then.status(200).header("content-type", "application/json").body(
				"{\"data\":[{\"id\":\"media-1\",\"media_type\":\"IMAGE\",\"media_url\":\"https://cdn.example.com/1.jpg\"},{\"id\":\"media-2\"}],\"paging\":{\"cursors\":{\"after\":\"cursor-b\",\"before\":\"cursor-a\"},\"next\":\"https://media.example.com/v1/me/media?after=cursor-b\"}}",
			);
		})
		.await;
	let count_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/me")
				.query_param("fields", "media_count")
				.query_param("access_token", "long-lived");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"media_count\":240}");
		})
		.await;
	let page = authorizer
		.media_list(&user, MediaQuery::new().with_limit(5).with_after("cursor-a"))
		.await
		.expect("Listing media should succeed.");

	media_mock.assert_async().await;
	count_mock.assert_async().await;

	assert_eq!(page.items.len(), 2);
	assert_eq!(page.items[0].id, "media-1");
	assert!(page.has_next, "A `next` paging link means a later page exists.");
	assert!(!page.has_prev, "No `previous` paging link means no earlier page.");
	assert_eq!(page.after.as_deref(), Some("cursor-b"));
	assert_eq!(page.media_count, Some(240));
}

#[tokio::test]
async fn out_of_range_limits_are_clamped_on_the_wire() {
	let server = MockServer::start_async().await;
	let (authorizer, store) = build_test_authorizer(build_config(&server));
	let user = make_user("user-1");

	seed_record(&store, &user).await;

	let media_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/media").query_param("limit", "20");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":[]}");
		})
		.await;
	let count_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let page = authorizer
		.media_list(&user, MediaQuery::new().with_limit(200))
		.await
		.expect("Listing media should succeed.");

	media_mock.assert_async().await;
	count_mock.assert_async().await;

	assert!(page.items.is_empty());
	assert!(!page.has_next);
	assert_eq!(page.media_count, None);
}

#[tokio::test]
async fn provider_failure_revokes_the_credential() {
	let server = MockServer::start_async().await;
	let (authorizer, store) = build_test_authorizer(build_config(&server));
	let user = make_user("user-1");

	seed_record(&store, &user).await;

	let media_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/media");
			then.status(403)
				.header("content-type", "application/json")
				.body("{\"error\":{\"message\":\"access token expired\",\"code\":190}}");
		})
		.await;
	let err = authorizer
		.media_list(&user, MediaQuery::new())
		.await
		.expect_err("A provider refusal must surface to the caller.");

	media_mock.assert_async().await;

	assert!(matches!(err, Error::Provider(_)));
	assert!(err.to_string().contains("access token expired"));

	let stored = store
		.fetch(&make_account(&user))
		.await
		.expect("Fetching after the failed listing should succeed.");

	assert_eq!(stored, None, "A credential the provider refused must be deleted.");
}

#[tokio::test]
async fn listing_runs_on_a_spawned_task() {
	let server = MockServer::start_async().await;
	let (authorizer, store) = build_test_authorizer(build_config(&server));
	let user = make_user("user-1");

	seed_record(&store, &user).await;

	let media_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/media");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":[{\"id\":\"media-1\"}]}");
		})
		.await;
	let count_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	// Listings are handed to worker tasks in server setups, so the whole call
	// must stay `Send`.
	let page = tokio::spawn(async move { authorizer.media_list(&user, MediaQuery::new()).await })
		.await
		.expect("The spawned listing task should not panic.")
		.expect("Listing media should succeed.");

	media_mock.assert_async().await;
	count_mock.assert_async().await;

	assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn any_client_failure_revokes_the_credential() {
	let store = Arc::new(MemoryStore::default());
	let provider = ProviderId::new("media-provider")
		.expect("Provider identifier should be valid for media tests.");
	let scope =
		ScopeSet::new(["user_media", "user_profile"]).expect("Scope fixture should be valid.");
	let authorizer =
		Authorizer::new(provider, scope, Arc::new(BrokenClient), store.clone(), store.clone());
	let user = make_user("user-1");

	seed_record(&store, &user).await;

	let err = authorizer
		.media_list(&user, MediaQuery::new())
		.await
		.expect_err("A client failure must surface to the caller.");

	assert!(matches!(err, Error::Config(_)));

	let stored = store
		.fetch(&make_account(&user))
		.await
		.expect("Fetching after the failed listing should succeed.");

	assert_eq!(stored, None, "Any client failure must delete the suspect credential.");
}

// A client whose transport broke down; it fails outside the provider error
// taxonomy the way a third-party implementation might.
struct BrokenClient;
impl ProviderClient for BrokenClient {
	fn authorize_url(&self, _scope: &ScopeSet, _state: Option<&str>) -> Result<Url> {
		unreachable!("Media listings must not build authorize URLs.")
	}

	fn exchange_code<'a>(&'a self, _code: &'a str) -> ProviderFuture<'a, TokenPayload> {
		unreachable!("Media listings must not exchange codes.")
	}

	fn exchange_long_lived<'a>(
		&'a self,
		_access_token: &'a str,
	) -> ProviderFuture<'a, TokenPayload> {
		unreachable!("Media listings must not upgrade tokens.")
	}

	fn refresh_token<'a>(&'a self, _refresh_token: &'a str) -> ProviderFuture<'a, TokenPayload> {
		unreachable!("Media listings must not refresh tokens.")
	}

	fn owner_profile<'a>(&'a self, _access_token: &'a str) -> ProviderFuture<'a, OwnerProfile> {
		unreachable!("Media listings must not fetch profiles.")
	}

	fn media_page<'a>(
		&'a self,
		_access_token: &'a str,
		_query: MediaQuery,
	) -> ProviderFuture<'a, MediaPage> {
		Box::pin(async move {
			Err(ConfigError::http_client_build(std::io::Error::other("connector shut down"))
				.into())
		})
	}
}
