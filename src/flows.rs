//! High-level flow orchestrators for provider authorization and phone login.

pub mod phone;
pub mod refresh;
pub mod revoke;

mod common;
mod handshake;
mod media;

pub use phone::*;
pub use refresh::*;
pub use revoke::*;

// self
use crate::{
	_prelude::*,
	auth::{Account, ProviderId, ScopeSet, UserId},
	provider::ProviderClient,
	store::{CredentialStore, StateStore},
};

/// Orchestrates the provider authorization lifecycle for local users.
///
/// The authorizer owns the provider client, handshake-state store, and
/// credential store so individual flow implementations can focus on their step
/// of the lifecycle (state issuance, code exchanges, refresh, compliance
/// cleanup). One authorizer instance serves exactly one provider.
#[derive(Clone)]
pub struct Authorizer {
	/// Client used for every outbound provider call.
	pub client: Arc<dyn ProviderClient>,
	/// Store holding single-use handshake states.
	pub states: Arc<dyn StateStore>,
	/// Store persisting token records and owner bindings.
	pub credentials: Arc<dyn CredentialStore>,
	/// Provider this authorizer talks to.
	pub provider: ProviderId,
	/// Scope set requested during the handshake.
	pub scope: ScopeSet,
	/// Lifetime of issued handshake states.
	pub state_ttl: Duration,
	/// Shared metrics recorder for refresh flow outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	flow_guards: Arc<Mutex<HashMap<Account, Arc<AsyncMutex<()>>>>>,
}
impl Authorizer {
	const DEFAULT_STATE_TTL: Duration = Duration::minutes(10);

	/// Creates an authorizer for one provider with the given collaborators.
	pub fn new(
		provider: ProviderId,
		scope: ScopeSet,
		client: Arc<dyn ProviderClient>,
		states: Arc<dyn StateStore>,
		credentials: Arc<dyn CredentialStore>,
	) -> Self {
		Self {
			client,
			states,
			credentials,
			provider,
			scope,
			state_ttl: Self::DEFAULT_STATE_TTL,
			refresh_metrics: Default::default(),
			flow_guards: Default::default(),
		}
	}

	/// Overrides the handshake state lifetime (defaults to ten minutes).
	pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
		self.state_ttl = ttl;

		self
	}

	fn account(&self, user: &UserId) -> Account {
		Account::new(user.clone(), self.provider.clone())
	}
}
impl Debug for Authorizer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authorizer")
			.field("provider", &self.provider)
			.field("scope", &self.scope)
			.field("state_ttl", &self.state_ttl)
			.finish()
	}
}
