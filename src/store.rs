//! Storage contracts and built-in backends for the persisted session record.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	session::{SessionRecord, TokenSecret},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the client-side session.
///
/// Every operation is atomic with respect to the others on the same store, so a refresh
/// that rotates the access token never interleaves with a logout half-way.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Fetches the current record, if one exists.
	fn fetch(&self) -> StoreFuture<'_, Option<SessionRecord>>;

	/// Persists or replaces the whole record.
	fn save(&self, record: SessionRecord) -> StoreFuture<'_, ()>;

	/// Replaces the access token of the stored record.
	///
	/// An empty store stays empty and reports [`AccessRotation::Missing`], so a refresh that
	/// lands after a logout cannot bring the session back.
	fn rotate_access_token(&self, token: TokenSecret) -> StoreFuture<'_, AccessRotation>;

	/// Removes both tokens while keeping the login name and role.
	fn purge_credentials(&self) -> StoreFuture<'_, ()>;

	/// Removes everything.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Result of [`SessionStore::rotate_access_token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessRotation {
	/// An existing record received the new token.
	Updated,
	/// No record exists; the token was discarded.
	Missing,
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

pub(crate) fn rotate_slot(slot: &mut Option<SessionRecord>, token: TokenSecret) -> AccessRotation {
	match slot {
		Some(record) => {
			record.access_token = Some(token);

			AccessRotation::Updated
		},
		None => AccessRotation::Missing,
	}
}

pub(crate) fn purge_slot(slot: &mut Option<SessionRecord>) {
	if let Some(record) = slot.as_mut() {
		record.purge_credentials();
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rotate_slot_never_revives_an_empty_store() {
		let mut slot = None;

		assert_eq!(rotate_slot(&mut slot, TokenSecret::new("T1")), AccessRotation::Missing);
		assert!(slot.is_none());

		slot = Some(SessionRecord::for_login("aquamarine"));

		assert_eq!(rotate_slot(&mut slot, TokenSecret::new("T2")), AccessRotation::Updated);
		assert_eq!(
			slot.and_then(|record| record.access_token).as_ref().map(TokenSecret::expose),
			Some("T2")
		);
	}

	#[test]
	fn access_rotation_can_be_serialized() {
		let payload = serde_json::to_string(&AccessRotation::Missing)
			.expect("AccessRotation should serialize to JSON.");

		assert_eq!(payload, "\"Missing\"");
	}
}
