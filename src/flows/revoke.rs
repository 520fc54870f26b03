//! Compliance-driven disconnects: user-initiated removal, provider-initiated
//! revocation, and full erasure with status lookup.

// self
use crate::{
	_prelude::*,
	auth::{OwnerId, UserId},
	flows::Authorizer,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::OwnerKey,
	webhook::{self, ErasureReceipt},
};

/// Outcome of a deletion-status lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletionStatus {
	/// Owner id decoded from the confirmation code.
	pub owner: OwnerId,
	/// Local user still bound to that owner, if any.
	pub user: Option<UserId>,
}
impl DeletionStatus {
	/// Whether a local user still maps to the owner id.
	pub fn user_found(&self) -> bool {
		self.user.is_some()
	}
}

impl Authorizer {
	/// Disconnects `user` locally: removes the credential and any pending
	/// handshake state.
	///
	/// The owner binding is kept so a later compliance callback can still find
	/// the user; use [`Authorizer::clear_authorization`] to drop that too.
	pub async fn remove_authorization(&self, user: &UserId) -> Result<()> {
		let account = self.account(user);

		self.states.remove_state(&account).await?;
		self.credentials.remove(&account).await?;

		Ok(())
	}

	/// Erases every trace of the connection for `user`, including the owner
	/// binding.
	pub async fn clear_authorization(&self, user: &UserId) -> Result<()> {
		let account = self.account(user);

		self.states.remove_state(&account).await?;
		self.credentials.unbind_owner(&account).await?;
		self.credentials.remove(&account).await?;

		Ok(())
	}

	/// Looks up the local user bound to a provider-side owner id.
	pub async fn user_for_owner(&self, owner: &OwnerId) -> Result<Option<UserId>> {
		Ok(self.credentials.user_for_owner(&OwnerKey::new(self.provider.clone(), *owner)).await?)
	}

	/// Handles a provider-initiated deauthorization for `owner`.
	///
	/// An owner id with no local binding is logged and swallowed; compliance
	/// callbacks succeed regardless.
	pub async fn revoke_for_owner(&self, owner: &OwnerId) -> Result<()> {
		const KIND: FlowKind = FlowKind::Revoke;

		let span = FlowSpan::new(KIND, "revoke_for_owner");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				match self.user_for_owner(owner).await? {
					Some(user) => self.remove_authorization(&user).await,
					None => {
						obs::flow_note(KIND, "deauthorization owner id has no local binding");

						Ok(())
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Handles a provider-initiated data-deletion request for `owner`.
	///
	/// Returns the receipt the provider expects: a status-check URL built on
	/// `status_base` plus the confirmation code it carries. An unmatched owner
	/// id is logged and the receipt is issued anyway.
	pub async fn erase_for_owner(
		&self,
		owner: &OwnerId,
		status_base: &Url,
	) -> Result<ErasureReceipt> {
		const KIND: FlowKind = FlowKind::Revoke;

		let span = FlowSpan::new(KIND, "erase_for_owner");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				match self.user_for_owner(owner).await? {
					Some(user) => self.clear_authorization(&user).await?,
					None => obs::flow_note(KIND, "erasure owner id has no local binding"),
				}

				Ok(ErasureReceipt::new(status_base, owner))
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Reports whether a user still maps to the owner id encoded in a
	/// confirmation `code`.
	pub async fn deletion_status(&self, code: &str) -> Result<DeletionStatus> {
		let owner = webhook::decode_confirmation_code(code)?;
		let user = self.user_for_owner(&owner).await?;

		Ok(DeletionStatus { owner, user })
	}
}
