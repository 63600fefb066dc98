//! Thread-safe in-memory [`SessionStore`] implementation for tests and short-lived tools.

// self
use crate::{
	_prelude::*,
	session::{SessionRecord, TokenSecret},
	store::{self, AccessRotation, SessionStore, StoreFuture},
};

type Slot = Arc<RwLock<Option<SessionRecord>>>;

/// Storage backend that keeps the session in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Creates a store seeded with `record`.
	pub fn with_record(record: SessionRecord) -> Self {
		Self(Arc::new(RwLock::new(Some(record))))
	}

	/// Returns a copy of the current record without going through the async contract.
	pub fn snapshot(&self) -> Option<SessionRecord> {
		self.0.read().clone()
	}
}
impl SessionStore for MemoryStore {
	fn fetch(&self) -> StoreFuture<'_, Option<SessionRecord>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, record: SessionRecord) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(record);

			Ok(())
		})
	}

	fn rotate_access_token(&self, token: TokenSecret) -> StoreFuture<'_, AccessRotation> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(store::rotate_slot(&mut slot.write(), token)) })
	}

	fn purge_credentials(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			store::purge_slot(&mut slot.write());

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			slot.write().take();

			Ok(())
		})
	}
}
