//! Account addressing for per-user provider connections.

// self
use crate::_prelude::*;
use crate::auth::{ProviderId, UserId};

/// Key addressing one user's connection to one provider.
///
/// Every stored handshake state and credential belongs to exactly one
/// account; a user connecting to two providers owns two independent
/// accounts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
	/// Local application user.
	pub user: UserId,
	/// Connected provider.
	pub provider: ProviderId,
}
impl Account {
	/// Creates an account key.
	pub fn new(user: UserId, provider: ProviderId) -> Self {
		Self { user, provider }
	}
}
impl Display for Account {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}@{}", self.user, self.provider)
	}
}
