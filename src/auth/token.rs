//! Token payloads, stored credential records, and lifecycle helpers.

// self
use crate::{
	_prelude::*,
	auth::{Account, OwnerProfile, Secret},
};

/// Token material returned by a provider endpoint.
///
/// Both expiry and refresh token are optional: a payload without an expiry
/// describes a token that never expires on its own, and providers only hand
/// out refresh tokens on long-lived grants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPayload {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<Secret>,
	/// Absolute expiry instant, if the token expires at all.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenPayload {
	/// Creates a payload carrying only an access token.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self { access_token: Secret::new(access_token), refresh_token: None, expires_at: None }
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(Secret::new(token));

		self
	}

	/// Sets an absolute expiry instant.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the expiry relative to the current clock.
	pub fn with_expires_in(self, duration: Duration) -> Self {
		self.with_expires_at(OffsetDateTime::now_utc() + duration)
	}
}

/// Stored credential binding a provider token to a local account.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Account this credential belongs to.
	pub account: Account,
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<Secret>,
	/// Instant the current token material was obtained.
	pub issued_at: OffsetDateTime,
	/// Expiry instant; `None` marks a token that never expires.
	pub expires_at: Option<OffsetDateTime>,
	/// Owner identity captured when the connection was established.
	pub owner: OwnerProfile,
}
impl TokenRecord {
	/// Creates a record from a fresh provider payload, stamped with the
	/// current clock.
	pub fn new(account: Account, owner: OwnerProfile, payload: TokenPayload) -> Self {
		Self::issued(account, owner, payload, OffsetDateTime::now_utc())
	}

	/// Creates a record with an explicit issued-at instant.
	pub fn issued(
		account: Account,
		owner: OwnerProfile,
		payload: TokenPayload,
		issued_at: OffsetDateTime,
	) -> Self {
		Self {
			account,
			access_token: payload.access_token,
			refresh_token: payload.refresh_token,
			issued_at,
			expires_at: payload.expires_at,
			owner,
		}
	}

	/// Produces the successor record after a refresh.
	///
	/// Token material is replaced wholesale; a refresh response without a new
	/// refresh token therefore drops the old one rather than reusing it.
	pub fn refreshed(&self, payload: TokenPayload, issued_at: OffsetDateTime) -> Self {
		Self::issued(self.account.clone(), self.owner.clone(), payload, issued_at)
	}

	/// Returns `true` if the record has expired at the provided instant.
	///
	/// Records without an expiry never expire.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		match self.expires_at {
			Some(expires_at) => instant >= expires_at,
			None => false,
		}
	}

	/// Returns `true` if the record is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("account", &self.account)
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("owner", &self.owner)
			.finish()
	}
}
