//! Session-aware REST client for the systemControl defect tracker: bearer tokens on every
//! call, single-flight refresh on expiry, and pluggable session stores.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod ext;
pub mod http;
pub mod obs;
pub mod refresh;
pub mod session;
pub mod store;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::SessionClient,
		config::ClientConfig,
		ext::LoginNavigator,
		http::ReqwestHttpClient,
		refresh::RefreshCoordinator,
		store::{MemoryStore, SessionStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = SessionClient<ReqwestHttpClient>;

	/// Navigator that records every login redirect it is asked to perform.
	#[derive(Debug, Default)]
	pub struct RecordingNavigator(Mutex<Vec<String>>);
	impl RecordingNavigator {
		/// Returns the login paths visited so far.
		pub fn visits(&self) -> Vec<String> {
			self.0.lock().clone()
		}
	}
	impl LoginNavigator for RecordingNavigator {
		fn redirect_to_login(&self, login_path: &str) {
			self.0.lock().push(login_path.to_owned());
		}
	}

	/// Handles returned by [`build_reqwest_test_client`] so tests can inspect side effects.
	pub struct TestHarness {
		/// Client under test.
		pub client: ReqwestTestClient,
		/// Session store shared with the client.
		pub store: Arc<MemoryStore>,
		/// Navigator shared with the client.
		pub navigator: Arc<RecordingNavigator>,
		/// Refresh coordinator shared with the client.
		pub coordinator: Arc<RefreshCoordinator>,
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a configuration pointed at `base_url` with default settings.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder()
			.base_url(Url::parse(base_url).expect("Test base URL should parse."))
			.build()
			.expect("Test client configuration should build.")
	}

	/// Constructs a [`SessionClient`] pointed at `base_url`, backed by an in-memory store, a
	/// fresh coordinator, and a recording navigator.
	pub fn build_reqwest_test_client(base_url: &str) -> TestHarness {
		build_reqwest_test_client_with(test_config(base_url))
	}

	/// Same as [`build_reqwest_test_client`] with a caller-provided configuration.
	pub fn build_reqwest_test_client_with(config: ClientConfig) -> TestHarness {
		let store = Arc::new(MemoryStore::default());
		let navigator = Arc::new(RecordingNavigator::default());
		let coordinator = Arc::new(RefreshCoordinator::default());
		let shared_store: Arc<dyn SessionStore> = store.clone();
		let shared_navigator: Arc<dyn LoginNavigator> = navigator.clone();
		let client = SessionClient::with_transport(
			config,
			shared_store,
			coordinator.clone(),
			test_reqwest_http_client(),
		)
		.with_navigator(shared_navigator);

		TestHarness { client, store, navigator, coordinator }
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
