//! Authorization handshake: state issuance, callback completion, and the
//! direct token connect path.

// self
use crate::{
	_prelude::*,
	auth::{Account, TokenPayload, TokenRecord, UserId},
	flows::{Authorizer, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl Authorizer {
	/// Starts an authorization handshake for `user` and returns the URL the
	/// end-user should be redirected to.
	///
	/// The issued state is single-use and expires after the configured state
	/// lifetime. An optional `source` tag is folded into the state and can be
	/// recovered from the callback via [`Authorizer::authorization_source`] to
	/// pick the post-callback redirect target.
	pub async fn start_authorization(&self, user: &UserId, source: Option<&str>) -> Result<Url> {
		const KIND: FlowKind = FlowKind::Handshake;

		let span = FlowSpan::new(KIND, "start_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let state = common::tag_state(&common::random_token(common::STATE_LEN), source);
				let url = self.client.authorize_url(&self.scope, Some(&state))?;
				let account = self.account(user);
				let expires_at = OffsetDateTime::now_utc() + self.state_ttl;

				self.states.put_state(&account, &state, expires_at).await?;

				Ok(url)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Recovers the redirect source tag carried by a callback `state`, if any.
	pub fn authorization_source<'a>(&self, state: &'a str) -> Option<&'a str> {
		common::source_of(state)
	}

	/// Completes the handshake: checks the returned state, exchanges the code,
	/// upgrades to a long-lived token, and persists the connection.
	///
	/// The stored state is consumed by the comparison even when it does not
	/// match, so a replayed callback always fails with [`Error::InvalidState`].
	pub async fn complete_authorization(
		&self,
		user: &UserId,
		state: &str,
		code: &str,
	) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Exchange;

		let span = FlowSpan::new(KIND, "complete_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let account = self.account(user);
				let stored = self.states.take_state(&account, OffsetDateTime::now_utc()).await?;

				if stored.as_deref() != Some(state) {
					return Err(Error::InvalidState);
				}

				let short_lived = self.client.exchange_code(code).await?;
				let payload =
					self.client.exchange_long_lived(short_lived.access_token.expose()).await?;

				self.persist_connection(account, payload).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Connects `user` from a client-supplied short-lived token, skipping the
	/// browser handshake.
	pub async fn connect_with_token(
		&self,
		user: &UserId,
		short_lived: &str,
	) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Exchange;

		let span = FlowSpan::new(KIND, "connect_with_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let payload = self.client.exchange_long_lived(short_lived).await?;

				self.persist_connection(self.account(user), payload).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn persist_connection(
		&self,
		account: Account,
		payload: TokenPayload,
	) -> Result<TokenRecord> {
		let owner = self.client.owner_profile(payload.access_token.expose()).await?;
		let record = TokenRecord::new(account.clone(), owner, payload);

		self.credentials.save(record.clone()).await?;
		self.credentials.bind_owner(&account, &record.owner.id).await?;

		Ok(record)
	}
}
