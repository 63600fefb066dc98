// self
use bearer_session::{
	session::{Role, SessionRecord, TokenSecret},
	store::{AccessRotation, MemoryStore, SessionStore},
};

fn signed_in() -> SessionRecord {
	SessionRecord::for_login("aquamarine")
		.with_access_token("access-1")
		.with_refresh_token("refresh-1")
		.with_role(Role::Manager)
}

#[tokio::test]
async fn save_and_fetch_round_trip() {
	let store = MemoryStore::default();

	store.save(signed_in()).await.expect("Saving a session into memory store should succeed.");

	let fetched = store
		.fetch()
		.await
		.expect("Fetching the session from memory store should succeed.")
		.expect("Stored session should remain present.");

	assert_eq!(fetched, signed_in());
	assert_eq!(fetched.authorization_header().as_deref(), Some("Bearer access-1"));
}

#[tokio::test]
async fn rotation_keeps_refresh_token_and_identity() {
	let store = MemoryStore::with_record(signed_in());
	let outcome = store
		.rotate_access_token(TokenSecret::new("access-2"))
		.await
		.expect("Rotating the access token should succeed.");

	assert_eq!(outcome, AccessRotation::Updated);

	let fetched = store.snapshot().expect("Rotated session should remain present.");

	assert_eq!(fetched.access_token.as_ref().map(TokenSecret::expose), Some("access-2"));
	assert_eq!(fetched.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-1"));
	assert_eq!(fetched.role, Some(Role::Manager));
}

#[tokio::test]
async fn rotation_leaves_a_cleared_store_empty() {
	let store = MemoryStore::with_record(signed_in());

	store.clear().await.expect("Clearing the store should succeed.");

	let outcome = store
		.rotate_access_token(TokenSecret::new("access-late"))
		.await
		.expect("Rotating into an empty store should succeed.");

	assert_eq!(outcome, AccessRotation::Missing);
	assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn purge_keeps_identity_and_clear_removes_everything() {
	let store = MemoryStore::with_record(signed_in());

	store.purge_credentials().await.expect("Purging credentials should succeed.");

	let purged = store.snapshot().expect("Identity should survive a purge.");

	assert!(!purged.is_authenticated());
	assert_eq!(purged.refresh_token, None);
	assert_eq!(purged.login.as_deref(), Some("aquamarine"));
	assert_eq!(purged.role, Some(Role::Manager));

	store.clear().await.expect("Clearing the store should succeed.");

	assert!(store.fetch().await.expect("Fetching a cleared store should succeed.").is_none());
	// Purging an empty store is a no-op.
	store.purge_credentials().await.expect("Purging an empty store should succeed.");

	assert!(store.snapshot().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn clones_share_one_slot_across_tasks() {
	let store = MemoryStore::with_record(signed_in());
	let tasks = (0..8)
		.map(|i| {
			let store = store.clone();

			tokio::spawn(async move {
				store
					.rotate_access_token(TokenSecret::new(format!("access-{i}")))
					.await
					.expect("Concurrent rotation should succeed.")
			})
		})
		.collect::<Vec<_>>();

	for task in tasks {
		assert_eq!(
			task.await.expect("Rotation task should not panic."),
			AccessRotation::Updated
		);
	}

	let fetched = store.snapshot().expect("Session should remain present.");
	let token = fetched.access_token.expect("An access token should remain stored.");

	assert!(token.expose().starts_with("access-"));
	assert_eq!(fetched.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-1"));
}
