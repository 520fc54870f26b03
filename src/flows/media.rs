//! Media listing with defensive credential revocation.

// self
use crate::{
	_prelude::*,
	auth::UserId,
	flows::Authorizer,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{MediaPage, MediaQuery},
};

impl Authorizer {
	/// Lists a page of the user's media.
	///
	/// Fails with [`Error::MissingToken`] when no credential is stored. Any
	/// client failure, save for storage errors, removes the stored credential
	/// before the error is returned; a token the provider rejected is never
	/// retried.
	pub async fn media_list(&self, user: &UserId, query: MediaQuery) -> Result<MediaPage> {
		const KIND: FlowKind = FlowKind::Media;

		let span = FlowSpan::new(KIND, "media_list");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let account = self.account(user);
				let record = self.credentials.fetch(&account).await?.ok_or(Error::MissingToken)?;

				match self.client.media_page(record.access_token.expose(), query).await {
					Ok(page) => Ok(page),
					Err(err) => {
						// Third-party clients may fail with any variant; only
						// storage errors leave the credential in place.
						if !matches!(err, Error::Storage(_)) {
							self.credentials.remove(&account).await?;
						}

						Err(err)
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
}
