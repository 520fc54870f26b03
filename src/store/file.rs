//! Simple file-backed store for lightweight deployments and bots.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{Account, OwnerId, TokenRecord, UserId},
	store::{CredentialStore, OwnerKey, StateEntry, StateStore, StoreError, StoreFuture},
};

#[derive(Debug, Default)]
struct FileInner {
	states: HashMap<Account, StateEntry>,
	credentials: HashMap<Account, TokenRecord>,
	owners: HashMap<OwnerKey, UserId>,
}

// Disk form; map keys are structs, so entries are flattened into pair lists.
#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
	#[serde(default)]
	states: Vec<(Account, StateEntry)>,
	#[serde(default)]
	credentials: Vec<TokenRecord>,
	#[serde(default)]
	owners: Vec<(OwnerKey, UserId)>,
}

/// Persists handshake states, credentials, and owner bindings to a JSON file
/// after each mutation.
///
/// Verification slots are deliberately not persisted; codes are short-lived
/// and a restart should invalidate them.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<FileInner>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot =
			if path.exists() { Self::load_snapshot(&path)? } else { FileInner::default() };

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(path: &Path) -> Result<FileInner, StoreError> {
		if !path.exists() {
			return Ok(FileInner::default());
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(FileInner::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let snapshot: Snapshot =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(FileInner {
			states: snapshot.states.into_iter().collect(),
			credentials: snapshot
				.credentials
				.into_iter()
				.map(|record| (record.account.clone(), record))
				.collect(),
			owners: snapshot.owners.into_iter().collect(),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}
		Ok(())
	}

	fn persist_locked(&self, contents: &FileInner) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot = Snapshot {
			states: contents.states.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
			credentials: contents.credentials.values().cloned().collect(),
			owners: contents.owners.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
		};
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl StateStore for FileStore {
	fn put_state<'a>(
		&'a self,
		account: &'a Account,
		state: &'a str,
		expires_at: OffsetDateTime,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard
				.states
				.insert(account.clone(), StateEntry { state: state.to_owned(), expires_at });
			self.persist_locked(&guard)?;

			Ok(())
		})
	}

	fn take_state<'a>(
		&'a self,
		account: &'a Account,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let entry = guard.states.remove(account);

			if entry.is_some() {
				self.persist_locked(&guard)?;
			}

			Ok(entry.filter(|entry| now < entry.expires_at).map(|entry| entry.state))
		})
	}

	fn remove_state<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			if guard.states.remove(account).is_some() {
				self.persist_locked(&guard)?;
			}

			Ok(())
		})
	}
}
impl CredentialStore for FileStore {
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.credentials.insert(record.account.clone(), record);
			self.persist_locked(&guard)?;

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, Option<TokenRecord>> {
		Box::pin(async move { Ok(self.inner.read().credentials.get(account).cloned()) })
	}

	fn remove<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			if guard.credentials.remove(account).is_some() {
				self.persist_locked(&guard)?;
			}

			Ok(())
		})
	}

	fn bind_owner<'a>(&'a self, account: &'a Account, owner: &'a OwnerId) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard
				.owners
				.retain(|key, user| !(key.provider == account.provider && user == &account.user));
			guard
				.owners
				.insert(OwnerKey::new(account.provider.clone(), *owner), account.user.clone());
			self.persist_locked(&guard)?;

			Ok(())
		})
	}

	fn user_for_owner<'a>(&'a self, key: &'a OwnerKey) -> StoreFuture<'a, Option<UserId>> {
		Box::pin(async move { Ok(self.inner.read().owners.get(key).cloned()) })
	}

	fn unbind_owner<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let before = guard.owners.len();

			guard
				.owners
				.retain(|key, user| !(key.provider == account.provider && user == &account.user));

			if guard.owners.len() != before {
				self.persist_locked(&guard)?;
			}

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::{OwnerId, OwnerProfile, ProviderId, TokenPayload, UserId};

	fn temp_path() -> PathBuf {
		let unique = format!(
			"connect_broker_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_account() -> Account {
		Account::new(
			UserId::new("user-demo").expect("Failed to build user fixture."),
			ProviderId::new("media").expect("Failed to build provider fixture."),
		)
	}

	fn build_record(account: &Account) -> TokenRecord {
		let owner = OwnerProfile::new(
			OwnerId::new(42).expect("Failed to build owner fixture."),
			"analogue",
		);
		let payload =
			TokenPayload::new("access-token").with_expires_in(Duration::hours(1));

		TokenRecord::new(account.clone(), owner, payload)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let account = build_account();
		let record = build_record(&account);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(record.clone()))
			.expect("Failed to save fixture record to file store.");
		rt.block_on(store.bind_owner(&account, &record.owner.id))
			.expect("Failed to bind owner in file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.fetch(&account))
			.expect("Failed to fetch fixture record from file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched.access_token.expose(), record.access_token.expose());

		let key = OwnerKey::new(account.provider.clone(), record.owner.id);
		let bound = rt
			.block_on(reopened.user_for_owner(&key))
			.expect("Failed to resolve owner binding from file store.");

		assert_eq!(bound.as_ref(), Some(&account.user));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn states_survive_reopen_until_taken() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let account = build_account();
		let now = OffsetDateTime::now_utc();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.put_state(&account, "state-token", now + Duration::minutes(10)))
			.expect("Failed to persist handshake state.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let taken = rt
			.block_on(reopened.take_state(&account, now))
			.expect("Failed to take handshake state from file store.");

		assert_eq!(taken.as_deref(), Some("state-token"));

		let again = rt
			.block_on(reopened.take_state(&account, now))
			.expect("Second take should succeed as an operation.");

		assert_eq!(again, None, "Handshake state must be single-use.");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
