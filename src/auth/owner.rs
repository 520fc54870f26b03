//! Provider-side owner identity.

// std
use std::num::ParseIntError;
// crates.io
use serde::{
	Deserializer, Serializer,
	de::{Error as DeError, Visitor},
};
// self
use crate::_prelude::*;

/// Numeric account id assigned by the provider to the media owner.
///
/// Providers serialize this value as either a JSON number or a decimal
/// string; both forms are accepted on the way in, and the string form is
/// emitted on the way out. Zero is never a valid owner id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerId(u64);
impl OwnerId {
	/// Creates an owner id after validation.
	pub fn new(value: u64) -> Result<Self, OwnerIdError> {
		if value == 0 {
			return Err(OwnerIdError::Zero);
		}

		Ok(Self(value))
	}

	/// Returns the raw numeric value.
	pub fn value(&self) -> u64 {
		self.0
	}
}
impl Debug for OwnerId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Owner({})", self.0)
	}
}
impl Display for OwnerId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.0)
	}
}
impl FromStr for OwnerId {
	type Err = OwnerIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s.parse()?)
	}
}
impl Serialize for OwnerId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.0.to_string())
	}
}
impl<'de> Deserialize<'de> for OwnerId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct OwnerIdVisitor;
		impl Visitor<'_> for OwnerIdVisitor {
			type Value = OwnerId;

			fn expecting(&self, f: &mut Formatter) -> FmtResult {
				f.write_str("a positive integer or its decimal string form")
			}

			fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
			where
				E: DeError,
			{
				OwnerId::new(value).map_err(DeError::custom)
			}

			fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
			where
				E: DeError,
			{
				let value =
					u64::try_from(value).map_err(|_| DeError::custom("Owner id cannot be negative."))?;

				OwnerId::new(value).map_err(DeError::custom)
			}

			fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
			where
				E: DeError,
			{
				value.parse().map_err(DeError::custom)
			}
		}

		deserializer.deserialize_any(OwnerIdVisitor)
	}
}

/// Error returned when owner id validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum OwnerIdError {
	/// Zero is reserved and never issued by a provider.
	#[error("Owner id cannot be zero.")]
	Zero,
	/// The value is not a decimal integer.
	#[error("Owner id is not a decimal integer.")]
	NotNumeric(#[from] ParseIntError),
}

/// Owner account details fetched from the provider graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnerProfile {
	/// Provider-side account id.
	pub id: OwnerId,
	/// Handle shown on the provider account.
	pub username: String,
	/// Account classification reported by the provider, when present.
	#[serde(default)]
	pub account_type: Option<String>,
	/// Total media count reported by the provider, when present.
	#[serde(default)]
	pub media_count: Option<u64>,
}
impl OwnerProfile {
	/// Creates a profile with only the required fields populated.
	pub fn new(id: OwnerId, username: impl Into<String>) -> Self {
		Self { id, username: username.into(), account_type: None, media_count: None }
	}

	/// Sets the reported account classification.
	pub fn with_account_type(mut self, account_type: impl Into<String>) -> Self {
		self.account_type = Some(account_type.into());

		self
	}

	/// Sets the reported media count.
	pub fn with_media_count(mut self, media_count: u64) -> Self {
		self.media_count = Some(media_count);

		self
	}
}
