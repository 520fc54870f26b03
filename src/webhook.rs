//! Signed compliance callbacks and erasure confirmation codes.
//!
//! Providers deliver deauthorization and data-deletion notices as a signed
//! request of the form `base64url(signature).base64url(payload)`, where the
//! signature is an HMAC-SHA256 over the encoded payload segment. This module
//! is the pure codec half of that handling; acting on the decoded event is
//! the business of [`crate::flows`].

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{OwnerId, Secret},
};

type HmacSha256 = Hmac<Sha256>;

/// Decoded provider compliance callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplianceEvent {
	/// Provider-side owner the event refers to, when the payload carried one.
	pub owner: Option<OwnerId>,
}

/// Verifies and decodes a `signature.payload` signed request.
///
/// The HMAC covers the encoded payload segment exactly as transmitted, so
/// verification happens before the payload itself is decoded. Every framing
/// defect, from a missing separator to undecodable JSON, is reported as
/// [`Error::InvalidSignature`]; a payload without a usable owner id is not an
/// error, the event simply carries [`None`].
pub fn parse_signed_request(raw: &str, secret: &Secret) -> Result<ComplianceEvent> {
	let (encoded_signature, encoded_payload) =
		raw.split_once('.').ok_or(Error::InvalidSignature)?;
	let signature =
		URL_SAFE_NO_PAD.decode(encoded_signature).map_err(|_| Error::InvalidSignature)?;
	let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes())
		.map_err(|_| Error::InvalidSignature)?;

	mac.update(encoded_payload.as_bytes());
	mac.verify_slice(&signature).map_err(|_| Error::InvalidSignature)?;

	let payload = URL_SAFE_NO_PAD.decode(encoded_payload).map_err(|_| Error::InvalidSignature)?;
	let payload =
		serde_json::from_slice::<SignedPayload>(&payload).map_err(|_| Error::InvalidSignature)?;

	Ok(ComplianceEvent { owner: payload.owner() })
}

/// Encodes an owner id as an opaque erasure confirmation code.
pub fn confirmation_code(owner: &OwnerId) -> String {
	URL_SAFE_NO_PAD.encode(owner.to_string())
}

/// Decodes a confirmation code back to the owner id it was issued for.
///
/// Garbage input of any shape maps to [`Error::InvalidCode`].
pub fn decode_confirmation_code(code: &str) -> Result<OwnerId> {
	let bytes = URL_SAFE_NO_PAD.decode(code).map_err(|_| Error::InvalidCode)?;
	let digits = String::from_utf8(bytes).map_err(|_| Error::InvalidCode)?;

	digits.parse().map_err(|_| Error::InvalidCode)
}

/// Answer for a data-deletion callback: where the provider can poll for
/// completion, and the code that query needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErasureReceipt {
	/// Status-check URL carrying the confirmation code.
	pub url: Url,
	/// Opaque code identifying the erased owner.
	pub confirmation_code: String,
}
impl ErasureReceipt {
	/// Builds a receipt pointing at `status_base` with the code appended as a
	/// `code` query parameter.
	pub fn new(status_base: &Url, owner: &OwnerId) -> Self {
		let confirmation_code = confirmation_code(owner);
		let mut url = status_base.clone();

		url.query_pairs_mut().append_pair("code", &confirmation_code);

		Self { url, confirmation_code }
	}
}

#[derive(Debug, Deserialize)]
struct SignedPayload {
	#[serde(default)]
	user_id: Option<serde_json::Value>,
}
impl SignedPayload {
	// Providers send the owner id as either a JSON string or a bare number.
	fn owner(&self) -> Option<OwnerId> {
		match self.user_id.as_ref()? {
			serde_json::Value::String(raw) => raw.parse().ok(),
			serde_json::Value::Number(raw) => raw.as_u64().and_then(|id| OwnerId::new(id).ok()),
			_ => None,
		}
	}
}
