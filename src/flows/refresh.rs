//! Credential refresh with fail-closed semantics.
//!
//! [`Authorizer::is_authorized`] is the liveness probe the HTTP layer calls
//! before rendering connected views. An expired record triggers an inline
//! `grant_type=refresh_token` call under a per-account singleflight guard;
//! any refresh failure deletes the stored credential so the broker never
//! retries against a token it suspects is dead.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Account, TokenRecord, UserId},
	flows::{Authorizer, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl Authorizer {
	/// Reports whether `user` holds a live credential, refreshing an expired
	/// record in place.
	///
	/// Provider refusal is folded into `Ok(false)` after the record has been
	/// deleted; storage failures still propagate as errors.
	pub async fn is_authorized(&self, user: &UserId) -> Result<bool> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "is_authorized");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let account = self.account(user);
				let Some(record) = self.credentials.fetch(&account).await? else {
					return Ok(false);
				};

				if !record.is_expired() {
					return Ok(true);
				}

				let guard = common::flow_guard(self, &account);
				let _singleflight = guard.lock().await;

				// Another caller may have refreshed while we waited.
				let Some(record) = self.credentials.fetch(&account).await? else {
					return Ok(false);
				};

				if !record.is_expired() {
					return Ok(true);
				}

				self.refresh_credential(&account, record).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn refresh_credential(&self, account: &Account, record: TokenRecord) -> Result<bool> {
		self.refresh_metrics.record_attempt();

		let Some(refresh_token) = record.refresh_token.as_ref() else {
			self.credentials.remove(account).await?;
			self.refresh_metrics.record_revocation();
			self.refresh_metrics.record_failure();

			return Ok(false);
		};

		match self.client.refresh_token(refresh_token.expose()).await {
			Ok(payload) => {
				let updated = record.refreshed(payload, OffsetDateTime::now_utc());

				self.credentials.save(updated.clone()).await?;
				self.refresh_metrics.record_success();

				Ok(!updated.is_expired())
			},
			Err(err) => {
				self.credentials.remove(account).await?;
				self.refresh_metrics.record_revocation();
				self.refresh_metrics.record_failure();
				obs::flow_note(
					FlowKind::Refresh,
					&format!("refresh rejected, credential removed: {err}"),
				);

				Ok(false)
			},
		}
	}
}
