//! Normalized phone numbers used as verification keys.

// self
use crate::_prelude::*;

/// Phone number reduced to its canonical dialable form.
///
/// Normalization keeps ASCII digits and a single leading `+`; every other
/// character (spaces, parentheses, dashes, letters) is dropped. Two raw
/// inputs that normalize to the same string address the same verification
/// slot.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);
impl PhoneNumber {
	/// Normalizes a raw user-supplied number.
	pub fn normalize(raw: &str) -> Self {
		let mut normalized = String::with_capacity(raw.len());

		for c in raw.chars() {
			if c.is_ascii_digit() || (c == '+' && normalized.is_empty()) {
				normalized.push(c);
			}
		}

		Self(normalized)
	}

	/// Returns the normalized form.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns `true` when normalization stripped every character.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for PhoneNumber {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for PhoneNumber {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Phone({})", self.0)
	}
}
impl Display for PhoneNumber {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
