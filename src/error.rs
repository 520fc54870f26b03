//! Broker-level error types shared across flows, providers, and stores.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// SMS dispatch failure.
	#[error("{0}")]
	Sms(
		#[from]
		#[source]
		crate::ext::SmsError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Provider call failed; the message carries the provider's own wording.
	#[error("{0}")]
	Provider(
		#[from]
		#[source]
		ProviderError,
	),

	/// Returned state is missing, expired, or does not match the stored one.
	#[error("Authorization state is missing, expired, or does not match.")]
	InvalidState,
	/// No credential is stored for the account.
	#[error("No access token is stored for this account.")]
	MissingToken,
	/// Signed payload failed signature verification or framing checks.
	#[error("Signed request signature mismatch.")]
	InvalidSignature,
	/// Confirmation code cannot be decoded into an owner id.
	#[error("Confirmation code is malformed.")]
	InvalidCode,
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Provider connection settings failed validation.
	#[error(transparent)]
	Provider(#[from] crate::provider::ProviderConfigError),
	/// User or provider identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
	/// Scope set failed validation.
	#[error(transparent)]
	Scope(#[from] crate::auth::ScopeValidationError),
	/// Owner id failed validation.
	#[error(transparent)]
	Owner(#[from] crate::auth::OwnerIdError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
// `#[from]` only generates the one-hop conversion, so validation errors get
// explicit routes into [`Error`] through [`Error::Config`].
impl From<crate::provider::ProviderConfigError> for Error {
	fn from(e: crate::provider::ProviderConfigError) -> Self {
		Self::Config(e.into())
	}
}
impl From<crate::auth::IdentifierError> for Error {
	fn from(e: crate::auth::IdentifierError) -> Self {
		Self::Config(e.into())
	}
}
impl From<crate::auth::ScopeValidationError> for Error {
	fn from(e: crate::auth::ScopeValidationError) -> Self {
		Self::Config(e.into())
	}
}
impl From<crate::auth::OwnerIdError> for Error {
	fn from(e: crate::auth::OwnerIdError) -> Self {
		Self::Config(e.into())
	}
}

/// Failure raised while talking to a provider endpoint.
///
/// The orchestrator treats every variant the same way (fail closed), so the
/// split exists for diagnostics rather than control flow.
#[derive(Debug, ThisError)]
pub enum ProviderError {
	/// Provider endpoint answered with an error payload.
	#[error("Provider endpoint returned an error: {message}.")]
	Endpoint {
		/// Provider-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Provider responded with JSON that could not be parsed.
	#[error("Provider returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl ProviderError {
	/// Creates an endpoint error carrying the provider's own message.
	pub fn endpoint(message: impl Into<String>, status: Option<u16>) -> Self {
		Self::Endpoint { message: message.into(), status }
	}

	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Human-readable message suitable for surfacing to API callers.
	pub fn message(&self) -> String {
		match self {
			Self::Endpoint { message, .. } => message.clone(),
			_ => self.to_string(),
		}
	}

	/// HTTP status reported by the provider, when the failure carries one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Endpoint { status, .. } | Self::ResponseParse { status, .. } => *status,
			Self::Transport { .. } => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ProviderError {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}
