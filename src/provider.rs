//! Provider-facing configuration (data) and clients (behavior).
//!
//! `config` exposes validated connection settings (`ProviderConfig`) covering
//! HTTPS-only endpoints, client credentials, and the provider's scope
//! delimiter. `graph` implements [`ProviderClient`] over a Graph-style HTTP
//! API. Orchestrators only ever see the trait, so tests and exotic providers
//! can substitute their own client.

pub mod config;
#[cfg(feature = "reqwest")]
pub mod graph;

pub use config::*;
#[cfg(feature = "reqwest")]
pub use graph::*;

// self
use crate::{
	_prelude::*,
	auth::{OwnerProfile, ScopeSet, TokenPayload},
};

/// Boxed future returned by every provider contract method.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Contract for talking to a media provider.
///
/// Implementations map wire formats and provider error payloads into the
/// broker taxonomy; callers never see raw HTTP.
pub trait ProviderClient
where
	Self: Send + Sync,
{
	/// Builds the user-facing authorization URL for the scope set, carrying
	/// the anti-forgery state when one is supplied.
	fn authorize_url(&self, scope: &ScopeSet, state: Option<&str>) -> Result<Url>;

	/// Exchanges an authorization code for a short-lived token.
	fn exchange_code<'a>(&'a self, code: &'a str) -> ProviderFuture<'a, TokenPayload>;

	/// Upgrades a short-lived token to a long-lived one.
	fn exchange_long_lived<'a>(
		&'a self,
		access_token: &'a str,
	) -> ProviderFuture<'a, TokenPayload>;

	/// Rotates a long-lived token using its refresh secret.
	fn refresh_token<'a>(&'a self, refresh_token: &'a str) -> ProviderFuture<'a, TokenPayload>;

	/// Fetches the owner identity behind the access token.
	fn owner_profile<'a>(&'a self, access_token: &'a str) -> ProviderFuture<'a, OwnerProfile>;

	/// Fetches one page of the owner's media library.
	fn media_page<'a>(
		&'a self,
		access_token: &'a str,
		query: MediaQuery,
	) -> ProviderFuture<'a, MediaPage>;
}

/// Cursor-based page request for the owner's media library.
///
/// The limit is clamped to the provider's supported window on the way in, so
/// a query can never leave the valid range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaQuery {
	/// Forward cursor; wins over `before` when both are set.
	pub after: Option<String>,
	/// Backward cursor.
	pub before: Option<String>,
	limit: u8,
}
impl MediaQuery {
	/// Page size applied when callers do not choose one.
	pub const DEFAULT_LIMIT: u8 = 12;
	/// Largest page the provider serves.
	pub const MAX_LIMIT: u8 = 20;
	/// Smallest meaningful page.
	pub const MIN_LIMIT: u8 = 1;

	/// Creates a query for the first page at the default size.
	pub fn new() -> Self {
		Self::default()
	}

	/// Pages forward from the cursor.
	pub fn with_after(mut self, cursor: impl Into<String>) -> Self {
		self.after = Some(cursor.into());

		self
	}

	/// Pages backward from the cursor.
	pub fn with_before(mut self, cursor: impl Into<String>) -> Self {
		self.before = Some(cursor.into());

		self
	}

	/// Sets the page size, clamped into the supported window.
	pub fn with_limit(mut self, limit: u8) -> Self {
		self.limit = limit.clamp(Self::MIN_LIMIT, Self::MAX_LIMIT);

		self
	}

	/// Effective page size.
	pub fn limit(&self) -> u8 {
		self.limit
	}
}
impl Default for MediaQuery {
	fn default() -> Self {
		Self { after: None, before: None, limit: Self::DEFAULT_LIMIT }
	}
}

/// Single media entry as reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
	/// Provider-side media id.
	pub id: String,
	/// Media classification (image, video, carousel), when reported.
	#[serde(default)]
	pub media_type: Option<String>,
	/// CDN URL for the media payload, when reported.
	#[serde(default)]
	pub media_url: Option<String>,
}

/// One page of the owner's media library plus paging facts.
#[derive(Clone, Debug, PartialEq, Default, Serialize)]
pub struct MediaPage {
	/// Media entries in provider order.
	pub items: Vec<MediaItem>,
	/// Whether a later page exists.
	pub has_next: bool,
	/// Whether an earlier page exists.
	pub has_prev: bool,
	/// Cursor for the next page, when one exists.
	pub after: Option<String>,
	/// Cursor for the previous page, when one exists.
	pub before: Option<String>,
	/// Owner's total media count, when the provider reports it.
	pub media_count: Option<u64>,
}
