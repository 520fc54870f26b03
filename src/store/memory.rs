//! Thread-safe in-memory store implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{Account, OwnerId, PhoneNumber, TokenRecord, UserId},
	store::{
		CredentialStore, OwnerKey, StateEntry, StateStore, StoreFuture, VerificationSlot,
		VerificationStore,
	},
};

#[derive(Debug, Default)]
struct MemoryInner {
	states: RwLock<HashMap<Account, StateEntry>>,
	credentials: RwLock<HashMap<Account, TokenRecord>>,
	owners: RwLock<HashMap<OwnerKey, UserId>>,
	slots: RwLock<HashMap<PhoneNumber, VerificationSlot>>,
	cooldowns: RwLock<HashMap<PhoneNumber, OffsetDateTime>>,
}

/// Thread-safe backend that keeps every store's data in-process.
///
/// Clones share the same underlying maps, so a clone handed to an
/// orchestrator observes writes made through the original.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<MemoryInner>);
impl MemoryStore {
	fn put_state_now(
		inner: Arc<MemoryInner>,
		account: Account,
		state: String,
		expires_at: OffsetDateTime,
	) {
		inner.states.write().insert(account, StateEntry { state, expires_at });
	}

	fn take_state_now(
		inner: Arc<MemoryInner>,
		account: Account,
		now: OffsetDateTime,
	) -> Option<String> {
		let entry = inner.states.write().remove(&account)?;

		if now >= entry.expires_at {
			return None;
		}

		Some(entry.state)
	}

	fn save_now(inner: Arc<MemoryInner>, record: TokenRecord) {
		inner.credentials.write().insert(record.account.clone(), record);
	}

	fn bind_owner_now(inner: Arc<MemoryInner>, account: Account, owner: OwnerId) {
		let mut owners = inner.owners.write();

		owners.retain(|key, user| !(key.provider == account.provider && *user == account.user));
		owners.insert(OwnerKey::new(account.provider, owner), account.user);
	}

	fn unbind_owner_now(inner: Arc<MemoryInner>, account: Account) {
		inner
			.owners
			.write()
			.retain(|key, user| !(key.provider == account.provider && *user == account.user));
	}

	fn consume_code_now(
		inner: Arc<MemoryInner>,
		phone: PhoneNumber,
		now: OffsetDateTime,
	) -> Option<String> {
		let mut slots = inner.slots.write();
		let slot = slots.get_mut(&phone)?;

		if slot.is_expired_at(now) || slot.remaining_attempts == 0 {
			slots.remove(&phone);

			return None;
		}

		slot.remaining_attempts -= 1;

		let code = slot.code.clone();

		if slot.remaining_attempts == 0 {
			slots.remove(&phone);
		}

		Some(code)
	}

	fn peek_code_now(
		inner: Arc<MemoryInner>,
		phone: PhoneNumber,
		now: OffsetDateTime,
	) -> Option<String> {
		let mut slots = inner.slots.write();

		match slots.get(&phone) {
			Some(slot) if slot.is_expired_at(now) => {
				slots.remove(&phone);

				None
			},
			Some(slot) => Some(slot.code.clone()),
			None => None,
		}
	}
}
impl StateStore for MemoryStore {
	fn put_state<'a>(
		&'a self,
		account: &'a Account,
		state: &'a str,
		expires_at: OffsetDateTime,
	) -> StoreFuture<'a, ()> {
		let inner = self.0.clone();
		let account = account.to_owned();
		let state = state.to_owned();

		Box::pin(async move { Ok(Self::put_state_now(inner, account, state, expires_at)) })
	}

	fn take_state<'a>(
		&'a self,
		account: &'a Account,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<String>> {
		let inner = self.0.clone();
		let account = account.to_owned();

		Box::pin(async move { Ok(Self::take_state_now(inner, account, now)) })
	}

	fn remove_state<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()> {
		let inner = self.0.clone();
		let account = account.to_owned();

		Box::pin(async move {
			inner.states.write().remove(&account);

			Ok(())
		})
	}
}
impl CredentialStore for MemoryStore {
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let inner = self.0.clone();

		Box::pin(async move { Ok(Self::save_now(inner, record)) })
	}

	fn fetch<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, Option<TokenRecord>> {
		let inner = self.0.clone();
		let account = account.to_owned();

		Box::pin(async move { Ok(inner.credentials.read().get(&account).cloned()) })
	}

	fn remove<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()> {
		let inner = self.0.clone();
		let account = account.to_owned();

		Box::pin(async move {
			inner.credentials.write().remove(&account);

			Ok(())
		})
	}

	fn bind_owner<'a>(&'a self, account: &'a Account, owner: &'a OwnerId) -> StoreFuture<'a, ()> {
		let inner = self.0.clone();
		let account = account.to_owned();
		let owner = *owner;

		Box::pin(async move { Ok(Self::bind_owner_now(inner, account, owner)) })
	}

	fn user_for_owner<'a>(&'a self, key: &'a OwnerKey) -> StoreFuture<'a, Option<UserId>> {
		let inner = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(inner.owners.read().get(&key).cloned()) })
	}

	fn unbind_owner<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()> {
		let inner = self.0.clone();
		let account = account.to_owned();

		Box::pin(async move { Ok(Self::unbind_owner_now(inner, account)) })
	}
}
impl VerificationStore for MemoryStore {
	fn put_slot<'a>(
		&'a self,
		phone: &'a PhoneNumber,
		slot: VerificationSlot,
	) -> StoreFuture<'a, ()> {
		let inner = self.0.clone();
		let phone = phone.to_owned();

		Box::pin(async move {
			inner.slots.write().insert(phone, slot);

			Ok(())
		})
	}

	fn consume_code<'a>(
		&'a self,
		phone: &'a PhoneNumber,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<String>> {
		let inner = self.0.clone();
		let phone = phone.to_owned();

		Box::pin(async move { Ok(Self::consume_code_now(inner, phone, now)) })
	}

	fn peek_code<'a>(
		&'a self,
		phone: &'a PhoneNumber,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<String>> {
		let inner = self.0.clone();
		let phone = phone.to_owned();

		Box::pin(async move { Ok(Self::peek_code_now(inner, phone, now)) })
	}

	fn arm_resend<'a>(
		&'a self,
		phone: &'a PhoneNumber,
		available_at: OffsetDateTime,
	) -> StoreFuture<'a, ()> {
		let inner = self.0.clone();
		let phone = phone.to_owned();

		Box::pin(async move {
			inner.cooldowns.write().insert(phone, available_at);

			Ok(())
		})
	}

	fn resend_available_at<'a>(
		&'a self,
		phone: &'a PhoneNumber,
	) -> StoreFuture<'a, Option<OffsetDateTime>> {
		let inner = self.0.clone();
		let phone = phone.to_owned();

		Box::pin(async move { Ok(inner.cooldowns.read().get(&phone).copied()) })
	}
}
