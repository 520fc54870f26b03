//! Provider-authorization and phone-login broker for media account linking: single-use
//! handshakes, long-lived token upkeep, cursor media reads, and signed compliance callbacks in
//! one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod ext;
pub mod flows;
pub mod obs;
pub mod provider;
pub mod store;
pub mod webhook;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		ext::MemorySms,
		flows::{PhoneConfig, PhoneLogin},
		store::MemoryStore,
	};
	#[cfg(feature = "reqwest")]
	use crate::{
		auth::{ProviderId, ScopeSet},
		flows::Authorizer,
		provider::{GraphClient, ProviderConfig},
	};

	/// Builds a [`PhoneLogin`] wired to a shared in-memory store and capture SMS gateway.
	pub fn build_test_phone_login(
		config: PhoneConfig,
	) -> (PhoneLogin, Arc<MemoryStore>, Arc<MemorySms>) {
		let store = Arc::new(MemoryStore::default());
		let sms = Arc::new(MemorySms::default());
		let login = PhoneLogin::with_config(store.clone(), sms.clone(), config);

		(login, store, sms)
	}

	/// Builds a reqwest client that accepts the self-signed certificates produced by `httpmock`
	/// during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Constructs an [`Authorizer`] backed by a shared in-memory store and the insecure test
	/// transport.
	#[cfg(feature = "reqwest")]
	pub fn build_test_authorizer(config: ProviderConfig) -> (Authorizer, Arc<MemoryStore>) {
		let store = Arc::new(MemoryStore::default());
		let client = GraphClient::with_client(config, test_reqwest_client());
		let scope =
			ScopeSet::new(["user_media", "user_profile"]).expect("Failed to build test scope.");
		let provider =
			ProviderId::new("media-provider").expect("Failed to build test provider id.");
		let authorizer =
			Authorizer::new(provider, scope, Arc::new(client), store.clone(), store.clone());

		(authorizer, store)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
#[cfg(test)] use connect_broker as _;
