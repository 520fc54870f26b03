//! Graph-style HTTP implementation of the provider contract.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{OwnerProfile, ScopeSet, TokenPayload},
	error::{ConfigError, ProviderError},
	provider::{MediaItem, MediaPage, MediaQuery, ProviderClient, ProviderConfig, ProviderFuture},
};

const PROFILE_FIELDS: &str = "id,username,account_type,media_count";
const MEDIA_FIELDS: &str = "id,media_type,media_url";
const COUNT_FIELDS: &str = "media_count";
const BODY_PREVIEW_LIMIT: usize = 256;

/// [`ProviderClient`] over a Graph-style HTTP API.
///
/// Token grants go to the token endpoint as form posts; the long-lived
/// upgrade, profile, and media reads are GET requests against the graph base
/// with the access token carried as a query parameter.
#[derive(Clone, Debug)]
pub struct GraphClient {
	config: ProviderConfig,
	http: ReqwestClient,
}
impl GraphClient {
	/// Builds a client with a fresh HTTP transport.
	pub fn new(config: ProviderConfig) -> Result<Self> {
		let http = ReqwestClient::builder().build().map_err(ConfigError::from)?;

		Ok(Self { config, http })
	}

	/// Wraps an existing transport, e.g. one with custom TLS settings.
	pub fn with_client(config: ProviderConfig, http: ReqwestClient) -> Self {
		Self { config, http }
	}

	/// Connection settings the client was built with.
	pub fn config(&self) -> &ProviderConfig {
		&self.config
	}

	fn graph_url(&self, segments: &[&str]) -> Url {
		let mut url = self.config.endpoints.graph.clone();

		// Infallible for the validated HTTPS base.
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}

	async fn post_token_form(&self, params: &[(&str, &str)]) -> Result<TokenPayload> {
		let response = self
			.http
			.post(self.config.endpoints.token.clone())
			.form(&params)
			.send()
			.await
			.map_err(ProviderError::from)?;
		let envelope: TokenEnvelope = read_json(response).await?;

		Ok(envelope.into_payload())
	}

	async fn get_json<T>(&self, url: Url) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.http.get(url).send().await.map_err(ProviderError::from)?;

		read_json(response).await
	}
}
impl ProviderClient for GraphClient {
	fn authorize_url(&self, scope: &ScopeSet, state: Option<&str>) -> Result<Url> {
		let mut url = self.config.endpoints.authorize.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("client_id", &self.config.client_id);
		pairs.append_pair("redirect_uri", self.config.redirect_uri.as_str());

		if let Some(joined) = scope.to_delimited(self.config.scope_delimiter) {
			pairs.append_pair("scope", &joined);
		}

		pairs.append_pair("response_type", "code");

		if let Some(state) = state {
			pairs.append_pair("state", state);
		}

		drop(pairs);

		Ok(url)
	}

	fn exchange_code<'a>(&'a self, code: &'a str) -> ProviderFuture<'a, TokenPayload> {
		Box::pin(async move {
			self.post_token_form(&[
				("client_id", self.config.client_id.as_str()),
				("client_secret", self.config.client_secret.expose()),
				("grant_type", "authorization_code"),
				("redirect_uri", self.config.redirect_uri.as_str()),
				("code", code),
			])
			.await
		})
	}

	fn exchange_long_lived<'a>(
		&'a self,
		access_token: &'a str,
	) -> ProviderFuture<'a, TokenPayload> {
		Box::pin(async move {
			let mut url = self.graph_url(&["access_token"]);

			// The query serializer is not `Send`, so it must go out of scope
			// before the request is awaited.
			{
				let mut pairs = url.query_pairs_mut();

				pairs.append_pair("grant_type", "exchange_token");
				pairs.append_pair("client_secret", self.config.client_secret.expose());
				pairs.append_pair("access_token", access_token);
			}

			let envelope: TokenEnvelope = self.get_json(url).await?;

			Ok(envelope.into_payload())
		})
	}

	fn refresh_token<'a>(&'a self, refresh_token: &'a str) -> ProviderFuture<'a, TokenPayload> {
		Box::pin(async move {
			self.post_token_form(&[
				("client_id", self.config.client_id.as_str()),
				("client_secret", self.config.client_secret.expose()),
				("grant_type", "refresh_token"),
				("refresh_token", refresh_token),
			])
			.await
		})
	}

	fn owner_profile<'a>(&'a self, access_token: &'a str) -> ProviderFuture<'a, OwnerProfile> {
		Box::pin(async move {
			let mut url = self.graph_url(&["me"]);

			{
				let mut pairs = url.query_pairs_mut();

				pairs.append_pair("fields", PROFILE_FIELDS);
				pairs.append_pair("access_token", access_token);
			}

			self.get_json(url).await
		})
	}

	fn media_page<'a>(
		&'a self,
		access_token: &'a str,
		query: MediaQuery,
	) -> ProviderFuture<'a, MediaPage> {
		Box::pin(async move {
			let mut url = self.graph_url(&["me", "media"]);

			{
				let mut pairs = url.query_pairs_mut();

				pairs.append_pair("fields", MEDIA_FIELDS);
				pairs.append_pair("limit", &query.limit().to_string());

				// `after` wins when both cursors are supplied.
				if let Some(after) = query.after.as_deref() {
					pairs.append_pair("after", after);
				} else if let Some(before) = query.before.as_deref() {
					pairs.append_pair("before", before);
				}

				pairs.append_pair("access_token", access_token);
			}

			let envelope: MediaEnvelope = self.get_json(url).await?;
			let mut count_url = self.graph_url(&["me"]);

			{
				let mut pairs = count_url.query_pairs_mut();

				pairs.append_pair("fields", COUNT_FIELDS);
				pairs.append_pair("access_token", access_token);
			}

			let count: CountEnvelope = self.get_json(count_url).await?;

			Ok(envelope.into_page(count.media_count))
		})
	}
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
}
impl TokenEnvelope {
	fn into_payload(self) -> TokenPayload {
		let mut payload = TokenPayload::new(self.access_token);

		if let Some(refresh_token) = self.refresh_token {
			payload = payload.with_refresh_token(refresh_token);
		}
		if let Some(expires_in) = self.expires_in {
			payload = payload
				.with_expires_at(OffsetDateTime::now_utc() + Duration::seconds(expires_in));
		}

		payload
	}
}

#[derive(Debug, Deserialize)]
struct MediaEnvelope {
	#[serde(default)]
	data: Vec<MediaItem>,
	#[serde(default)]
	paging: Option<PagingEnvelope>,
}
impl MediaEnvelope {
	fn into_page(self, media_count: Option<u64>) -> MediaPage {
		let paging = self.paging.unwrap_or_default();
		let cursors = paging.cursors.unwrap_or_default();

		MediaPage {
			items: self.data,
			has_next: paging.next.is_some(),
			has_prev: paging.previous.is_some(),
			after: cursors.after,
			before: cursors.before,
			media_count,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
struct PagingEnvelope {
	#[serde(default)]
	cursors: Option<CursorEnvelope>,
	#[serde(default)]
	next: Option<String>,
	#[serde(default)]
	previous: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CursorEnvelope {
	#[serde(default)]
	after: Option<String>,
	#[serde(default)]
	before: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountEnvelope {
	#[serde(default)]
	media_count: Option<u64>,
}

async fn read_json<T>(response: reqwest::Response) -> Result<T>
where
	T: DeserializeOwned,
{
	let status = response.status();
	let bytes = response.bytes().await.map_err(ProviderError::from)?;

	if !status.is_success() {
		return Err(
			ProviderError::endpoint(extract_error_message(&bytes), Some(status.as_u16())).into()
		);
	}

	let deserializer = &mut serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(deserializer)
		.map_err(|source| ProviderError::ResponseParse { source, status: Some(status.as_u16()) }.into())
}

// Graph APIs answer with either a flat `error_message` or a nested
// `error.message`; anything else degrades to a body preview.
fn extract_error_message(bytes: &[u8]) -> String {
	if let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) {
		if let Some(message) = value.get("error_message").and_then(|v| v.as_str()) {
			return message.to_owned();
		}
		if let Some(message) =
			value.get("error").and_then(|error| error.get("message")).and_then(|v| v.as_str())
		{
			return message.to_owned();
		}
	}

	truncate_preview(String::from_utf8_lossy(bytes).into_owned())
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn build_client() -> GraphClient {
		let base = "https://media.example.com";
		let parse = |path: &str| {
			Url::parse(&format!("{base}{path}")).expect("Fixture URL should parse successfully.")
		};
		let config = ProviderConfig::builder()
			.client_id("app-123")
			.client_secret("app-secret")
			.redirect_uri(parse("/callback"))
			.authorize_endpoint(parse("/oauth/authorize"))
			.token_endpoint(parse("/oauth/access_token"))
			.graph_endpoint(parse("/v1"))
			.build()
			.expect("Fixture config should validate.");

		GraphClient::with_client(config, ReqwestClient::new())
	}

	#[test]
	fn authorize_url_carries_expected_parameters() {
		let client = build_client();
		let scope = ScopeSet::new(["user_media", "user_profile"])
			.expect("Scope fixture should be valid.");
		let url = client
			.authorize_url(&scope, Some("state-token"))
			.expect("Authorize URL should build successfully.");
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(pairs.get("client_id"), Some(&"app-123".into()));
		assert_eq!(pairs.get("redirect_uri"), Some(&"https://media.example.com/callback".into()));
		assert_eq!(pairs.get("scope"), Some(&"user_media,user_profile".into()));
		assert_eq!(pairs.get("response_type"), Some(&"code".into()));
		assert_eq!(pairs.get("state"), Some(&"state-token".into()));
	}

	#[test]
	fn authorize_url_omits_optional_parameters() {
		let client = build_client();
		let url = client
			.authorize_url(&ScopeSet::default(), None)
			.expect("Authorize URL should build successfully.");
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert!(!pairs.contains_key("scope"));
		assert!(!pairs.contains_key("state"));
	}

	#[test]
	fn graph_urls_extend_the_base_path() {
		let client = build_client();

		assert_eq!(client.graph_url(&["me"]).as_str(), "https://media.example.com/v1/me");
		assert_eq!(
			client.graph_url(&["me", "media"]).as_str(),
			"https://media.example.com/v1/me/media"
		);
	}

	#[test]
	fn error_messages_prefer_structured_fields() {
		assert_eq!(
			extract_error_message(br#"{"error_message":"Invalid platform app"}"#),
			"Invalid platform app"
		);
		assert_eq!(
			extract_error_message(br#"{"error":{"message":"Unsupported request","code":100}}"#),
			"Unsupported request"
		);
		assert_eq!(extract_error_message(b"<html>bad gateway</html>"), "<html>bad gateway</html>");
	}

	#[test]
	fn long_bodies_are_truncated_in_previews() {
		let body = "x".repeat(BODY_PREVIEW_LIMIT + 10);
		let preview = truncate_preview(body);

		assert_eq!(preview.chars().count(), BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}

	#[test]
	fn media_envelope_maps_paging_links_to_flags() {
		let envelope: MediaEnvelope = serde_json::from_str(
			r#"{
				"data": [{"id": "media-1", "media_type": "IMAGE", "media_url": "https://cdn.example.com/1.jpg"}],
				"paging": {
					"cursors": {"after": "aft", "before": "bef"},
					"next": "https://media.example.com/v1/me/media?after=aft"
				}
			}"#,
		)
		.expect("Media envelope fixture should deserialize.");
		let page = envelope.into_page(Some(240));

		assert_eq!(page.items.len(), 1);
		assert!(page.has_next);
		assert!(!page.has_prev, "Absent `previous` link means no earlier page.");
		assert_eq!(page.after.as_deref(), Some("aft"));
		assert_eq!(page.before.as_deref(), Some("bef"));
		assert_eq!(page.media_count, Some(240));
	}
}
