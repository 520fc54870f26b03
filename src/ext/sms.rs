//! SMS delivery contract used by the phone verification flow.

// self
use crate::{_prelude::*, auth::PhoneNumber};

/// Boxed future returned by [`SmsSender`] operations.
pub type SmsFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SmsError>> + 'a + Send>>;

/// Contract for dispatching a text message to a phone number.
pub trait SmsSender
where
	Self: Send + Sync,
{
	/// Delivers `body` to the given number.
	fn send<'a>(&'a self, to: &'a PhoneNumber, body: &'a str) -> SmsFuture<'a, ()>;
}

/// Errors raised by SMS gateways.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SmsError {
	/// The gateway refused or failed to deliver the message.
	#[error("Dispatch failure: {message}.")]
	Dispatch {
		/// Gateway-provided failure detail.
		message: String,
	},
}
impl SmsError {
	/// Builds a [`SmsError::Dispatch`] from any displayable detail.
	pub fn dispatch(message: impl Into<String>) -> Self {
		Self::Dispatch { message: message.into() }
	}
}

/// A delivered message captured by [`MemorySms`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentSms {
	/// Destination number in normal form.
	pub to: PhoneNumber,
	/// Message body as handed to the gateway.
	pub body: String,
}

/// Capturing [`SmsSender`] that records every message instead of sending it.
///
/// Clones share the underlying log, so a copy handed to a flow can be
/// inspected from the test afterwards.
#[derive(Clone, Debug, Default)]
pub struct MemorySms(Arc<RwLock<Vec<SentSms>>>);
impl MemorySms {
	/// Creates an empty capture log.
	pub fn new() -> Self {
		Self::default()
	}

	/// Snapshot of every message delivered so far, oldest first.
	pub fn sent(&self) -> Vec<SentSms> {
		self.0.read().clone()
	}
}
impl SmsSender for MemorySms {
	fn send<'a>(&'a self, to: &'a PhoneNumber, body: &'a str) -> SmsFuture<'a, ()> {
		let log = self.0.clone();
		let message = SentSms { to: to.clone(), body: body.to_owned() };

		Box::pin(async move {
			log.write().push(message);

			Ok(())
		})
	}
}
