//! Shared helpers for flow implementations (state tagging, singleflight guards).

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{_prelude::*, auth::Account, flows::Authorizer};

pub(crate) const STATE_LEN: usize = 32;

const SOURCE_MARKER: &str = "-src-";

/// Appends the redirect source tag to a fresh state token.
pub(crate) fn tag_state(state: &str, source: Option<&str>) -> String {
	match source {
		Some(source) if !source.is_empty() => format!("{state}{SOURCE_MARKER}{source}"),
		_ => state.to_owned(),
	}
}

/// Recovers the redirect source tag from a returned state, if present.
pub(crate) fn source_of(state: &str) -> Option<&str> {
	state.rsplit_once(SOURCE_MARKER).map(|(_, source)| source).filter(|source| !source.is_empty())
}

pub(crate) fn random_token(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

/// Returns (and creates on demand) the singleflight guard for an account.
pub(crate) fn flow_guard(authorizer: &Authorizer, account: &Account) -> Arc<AsyncMutex<()>> {
	let mut guards = authorizer.flow_guards.lock();

	guards.entry(account.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn source_tags_round_trip() {
		let tagged = tag_state("abc123", Some("photos"));

		assert_eq!(tagged, "abc123-src-photos");
		assert_eq!(source_of(&tagged), Some("photos"));
		assert_eq!(source_of("abc123"), None);
	}

	#[test]
	fn empty_sources_are_not_tagged() {
		assert_eq!(tag_state("abc123", Some("")), "abc123");
		assert_eq!(tag_state("abc123", None), "abc123");
		assert_eq!(source_of("abc123-src-"), None);
	}

	#[test]
	fn random_tokens_are_alphanumeric() {
		let token = random_token(STATE_LEN);

		assert_eq!(token.len(), STATE_LEN);
		assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
	}
}
