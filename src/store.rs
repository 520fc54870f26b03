//! Storage contracts and built-in store implementations for broker state.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{Account, OwnerId, PhoneNumber, ProviderId, TokenRecord, UserId},
};

/// Boxed future returned by every store contract method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for single-use handshake states.
///
/// A state slot holds at most one token per account; writing a second one
/// replaces the first.
pub trait StateStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the handshake state for the account.
	fn put_state<'a>(
		&'a self,
		account: &'a Account,
		state: &'a str,
		expires_at: OffsetDateTime,
	) -> StoreFuture<'a, ()>;

	/// Removes and returns the stored state, if any.
	///
	/// Entries past their expiry are purged and reported as absent. The
	/// removal happens unconditionally so a state can never be consumed
	/// twice.
	fn take_state<'a>(
		&'a self,
		account: &'a Account,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<String>>;

	/// Removes the stored state without returning it.
	fn remove_state<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()>;
}

/// Persistence contract for provider credentials and the owner reverse index.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the credential for the record's account.
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Fetches the credential for the account, if present.
	fn fetch<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Removes the credential for the account. Removing an absent credential
	/// succeeds.
	fn remove<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()>;

	/// Records that the provider-side owner id belongs to the account's user.
	///
	/// A user holds at most one owner binding per provider, so rebinding to a
	/// new owner id replaces the previous entry.
	fn bind_owner<'a>(&'a self, account: &'a Account, owner: &'a OwnerId) -> StoreFuture<'a, ()>;

	/// Resolves the local user bound to the provider-side owner id.
	fn user_for_owner<'a>(&'a self, key: &'a OwnerKey) -> StoreFuture<'a, Option<UserId>>;

	/// Removes the account's owner binding. Removing an absent binding
	/// succeeds.
	fn unbind_owner<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()>;
}

/// Persistence contract for phone verification slots and resend cooldowns.
pub trait VerificationStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the verification slot for the phone number.
	fn put_slot<'a>(
		&'a self,
		phone: &'a PhoneNumber,
		slot: VerificationSlot,
	) -> StoreFuture<'a, ()>;

	/// Spends one attempt and returns the stored code.
	///
	/// The attempt is consumed whether or not the caller's guess matches;
	/// expired or exhausted slots are purged and reported as absent.
	fn consume_code<'a>(
		&'a self,
		phone: &'a PhoneNumber,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<String>>;

	/// Returns the stored code without spending an attempt.
	fn peek_code<'a>(
		&'a self,
		phone: &'a PhoneNumber,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<String>>;

	/// Arms the resend cooldown, recording when the next send is permitted.
	fn arm_resend<'a>(
		&'a self,
		phone: &'a PhoneNumber,
		available_at: OffsetDateTime,
	) -> StoreFuture<'a, ()>;

	/// Returns the instant the next send is permitted, if a cooldown was ever
	/// armed.
	fn resend_available_at<'a>(
		&'a self,
		phone: &'a PhoneNumber,
	) -> StoreFuture<'a, Option<OffsetDateTime>>;
}

// Stored handshake row shared by the built-in backends.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct StateEntry {
	pub(crate) state: String,
	pub(crate) expires_at: OffsetDateTime,
}

/// One phone verification window: the code, its attempt budget, and expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSlot {
	/// Code the user must echo back.
	pub code: String,
	/// Verification attempts left before the slot is exhausted.
	pub remaining_attempts: u32,
	/// Instant the slot stops accepting attempts.
	pub expires_at: OffsetDateTime,
}
impl VerificationSlot {
	/// Creates a slot with a full attempt budget.
	pub fn new(code: impl Into<String>, remaining_attempts: u32, expires_at: OffsetDateTime) -> Self {
		Self { code: code.into(), remaining_attempts, expires_at }
	}

	/// Returns `true` once the slot has passed its expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}

/// Unique key identifying an owner reverse-index entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerKey {
	/// Provider the owner id belongs to.
	pub provider: ProviderId,
	/// Provider-side owner id.
	pub owner: OwnerId,
}
impl OwnerKey {
	/// Builds a key from the provider and owner halves.
	pub fn new(provider: ProviderId, owner: OwnerId) -> Self {
		Self { provider, owner }
	}
}

/// Error type produced by store implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures (e.g., serde) surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
