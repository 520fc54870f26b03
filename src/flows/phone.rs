//! Phone possession verification via SMS one-time codes.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	auth::PhoneNumber,
	ext::SmsSender,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{VerificationSlot, VerificationStore},
};

/// Tunables for the verification flow.
#[derive(Clone, Debug)]
pub struct PhoneConfig {
	/// Verification attempts permitted per issued code.
	pub attempt_budget: u32,
	/// Lifetime of an issued code.
	pub code_ttl: Duration,
	/// Minimum interval between deliveries for the same number.
	pub resend_interval: Duration,
}
impl Default for PhoneConfig {
	fn default() -> Self {
		Self {
			attempt_budget: 3,
			code_ttl: Duration::minutes(5),
			resend_interval: Duration::seconds(60),
		}
	}
}

/// Orchestrates one-time code issuance, verification, and resends.
///
/// Every operation normalizes the supplied phone number first, so callers can
/// pass numbers exactly as users typed them.
#[derive(Clone)]
pub struct PhoneLogin {
	/// Store holding verification slots and resend cooldowns.
	pub codes: Arc<dyn VerificationStore>,
	/// Gateway used to deliver codes.
	pub sms: Arc<dyn SmsSender>,
	/// Flow tunables.
	pub config: PhoneConfig,
}
impl PhoneLogin {
	/// Creates a login flow with default tunables.
	pub fn new(codes: Arc<dyn VerificationStore>, sms: Arc<dyn SmsSender>) -> Self {
		Self::with_config(codes, sms, PhoneConfig::default())
	}

	/// Creates a login flow with caller-provided tunables.
	pub fn with_config(
		codes: Arc<dyn VerificationStore>,
		sms: Arc<dyn SmsSender>,
		config: PhoneConfig,
	) -> Self {
		Self { codes, sms, config }
	}

	/// Issues a fresh code for `phone`, delivers it over SMS, and returns it.
	///
	/// The returned code is exactly what the SMS carries, so callers that
	/// deliver through their own channel can reuse it verbatim.
	pub async fn start(&self, phone: &str) -> Result<String> {
		self.start_at(phone, OffsetDateTime::now_utc()).await
	}

	/// [`PhoneLogin::start`] with an explicit clock.
	pub async fn start_at(&self, phone: &str, now: OffsetDateTime) -> Result<String> {
		const KIND: FlowKind = FlowKind::Phone;

		let span = FlowSpan::new(KIND, "start");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let phone = PhoneNumber::normalize(phone);
				let code = generate_code();
				let slot = VerificationSlot::new(
					&code,
					self.config.attempt_budget,
					now + self.config.code_ttl,
				);

				self.codes.put_slot(&phone, slot).await?;
				self.send_code(&phone, &code, now).await?;

				Ok(code)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Checks `code` against the stored slot, spending one attempt.
	///
	/// A wrong guess consumes an attempt exactly like a right one; once the
	/// budget is spent, even the correct code fails.
	pub async fn verify(&self, phone: &str, code: &str) -> Result<bool> {
		self.verify_at(phone, code, OffsetDateTime::now_utc()).await
	}

	/// [`PhoneLogin::verify`] with an explicit clock.
	pub async fn verify_at(&self, phone: &str, code: &str, now: OffsetDateTime) -> Result<bool> {
		const KIND: FlowKind = FlowKind::Phone;

		let span = FlowSpan::new(KIND, "verify");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let phone = PhoneNumber::normalize(phone);
				let stored = self.codes.consume_code(&phone, now).await?;

				Ok(matches!(
					stored,
					Some(stored) if !stored.is_empty() && !code.is_empty() && stored == code
				))
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Re-sends the current code if the cooldown has elapsed.
	///
	/// Returns `false`, leaving the stored code and cooldown untouched, when
	/// called too early or when no code is pending.
	pub async fn resend(&self, phone: &str) -> Result<bool> {
		self.resend_at(phone, OffsetDateTime::now_utc()).await
	}

	/// [`PhoneLogin::resend`] with an explicit clock.
	pub async fn resend_at(&self, phone: &str, now: OffsetDateTime) -> Result<bool> {
		const KIND: FlowKind = FlowKind::Phone;

		let span = FlowSpan::new(KIND, "resend");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let phone = PhoneNumber::normalize(phone);

				if !self.can_resend_at(&phone, now).await? {
					return Ok(false);
				}

				let Some(code) = self.codes.peek_code(&phone, now).await? else {
					return Ok(false);
				};

				self.send_code(&phone, &code, now).await?;

				Ok(true)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Remaining cooldown before [`PhoneLogin::resend`] will deliver again.
	pub async fn resend_timeout(&self, phone: &str) -> Result<Duration> {
		self.resend_timeout_at(phone, OffsetDateTime::now_utc()).await
	}

	/// [`PhoneLogin::resend_timeout`] with an explicit clock.
	pub async fn resend_timeout_at(&self, phone: &str, now: OffsetDateTime) -> Result<Duration> {
		let phone = PhoneNumber::normalize(phone);

		Ok(match self.codes.resend_available_at(&phone).await? {
			Some(at) if at > now => at - now,
			_ => Duration::ZERO,
		})
	}

	async fn can_resend_at(&self, phone: &PhoneNumber, now: OffsetDateTime) -> Result<bool> {
		// A number that never received a code has nothing to resend.
		Ok(matches!(self.codes.resend_available_at(phone).await?, Some(at) if at < now))
	}

	async fn send_code(&self, phone: &PhoneNumber, code: &str, now: OffsetDateTime) -> Result<()> {
		self.sms.send(phone, &format!("{code} is your verification code.")).await?;
		self.codes.arm_resend(phone, now + self.config.resend_interval).await?;

		Ok(())
	}
}
impl Debug for PhoneLogin {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PhoneLogin").field("config", &self.config).finish()
	}
}

fn generate_code() -> String {
	rand::rng().random_range(1000..=9999_u16).to_string()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn codes_are_four_digits() {
		for _ in 0..64 {
			let code = generate_code();

			assert_eq!(code.len(), 4);
			assert!(code.parse::<u16>().expect("Codes are numeric.") >= 1000);
		}
	}
}
