//! Session-aware client facade and the 401 refresh-and-retry protocol.
//!
//! Every authorized call reads the stored access token, attaches it as a bearer header, and
//! dispatches. A first 401 marks the request retried and waits for a refreshed token through
//! the shared [`RefreshCoordinator`]: the first caller leads the single `auth/refresh` call,
//! later callers queue behind it. Once the refresh settles every queued request is either
//! re-sent with the new token or failed with the same [`RefreshFailure`]. A second 401 on a
//! retried request is final.
//!
//! A failed refresh ends the session: tokens are purged, the transport forgets its
//! credentials, and the navigator is sent to the login path. A refresh that finishes after
//! logout is treated as failed, since its token has no session to land in.

// self
use crate::{
	_prelude::*,
	config::{ClientConfig, RefreshCredential},
	error::{ConfigError, DecodeError},
	ext::{BearerSigner, LoginNavigator, NullNavigator, RequestSignerExt},
	http::{ApiRequest, ApiResponse, ApiTransport, OutboundRequest},
	obs::{self, CallOutcome, CallSpan},
	refresh::{Enlistment, RefreshCoordinator, RefreshFailure, RefreshMetrics, RefreshTicket},
	session::{SessionRecord, TokenSecret},
	store::{AccessRotation, SessionStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Client specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestSessionClient = SessionClient<ReqwestHttpClient>;

/// Path of the refresh endpoint, relative to the base URL.
pub const REFRESH_PATH: &str = "auth/refresh";

const REFRESH_OPERATION: &str = "Token refresh";

#[derive(Debug, Deserialize)]
struct RefreshGrant {
	#[serde(default)]
	access_token: Option<TokenSecret>,
}

/// Authenticated API client.
///
/// Clones share the transport, the store, the coordinator, and the metrics, so one refresh
/// cycle covers every clone.
pub struct SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Transport used for every outbound call, refresh included.
	pub transport: Arc<T>,
	/// Session store holding the credential pair and identity.
	pub store: Arc<dyn SessionStore>,
	/// Validated client configuration.
	pub config: Arc<ClientConfig>,
	/// Flag-and-queue state for the single-flight refresh.
	pub coordinator: Arc<RefreshCoordinator>,
	/// Hook invoked after a failed refresh purged the session.
	pub navigator: Arc<dyn LoginNavigator>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	signer: BearerSigner,
}
impl<T> SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client over a caller-provided transport and coordinator.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn SessionStore>,
		coordinator: Arc<RefreshCoordinator>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config: Arc::new(config),
			coordinator,
			navigator: Arc::new(NullNavigator),
			refresh_metrics: Default::default(),
			signer: BearerSigner,
		}
	}

	/// Replaces the login navigator.
	pub fn with_navigator(mut self, navigator: Arc<dyn LoginNavigator>) -> Self {
		self.navigator = navigator;

		self
	}

	/// Sends an authorized request, recovering once from an expired access token.
	///
	/// Any status other than 401 is returned as-is; callers decide what it means.
	pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		let record = self.store.fetch().await?;
		let epoch = self.coordinator.epoch();
		let sent_with = record.as_ref().and_then(|record| record.access_token.clone());
		let response = self.dispatch(&request, record.as_ref()).await?;

		if !response.is_unauthorized() {
			return Ok(response);
		}
		if request.is_retried() {
			return Err(Error::Unauthorized { path: request.path });
		}

		request.mark_retried();

		let token = self.recover(epoch, sent_with.as_ref()).await?;

		self.refresh_metrics.record_retry();

		let retry_record = SessionRecord::default().with_access_token(token);
		let response = self.dispatch(&request, Some(&retry_record)).await?;

		if response.is_unauthorized() {
			#[cfg(feature = "tracing")]
			tracing::warn!(path = %request.path, "request rejected again after token refresh");

			return Err(Error::Unauthorized { path: request.path });
		}

		Ok(response)
	}

	/// Sends a request without a bearer header and without the refresh protocol.
	pub async fn send_public(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.dispatch(&request, None).await
	}

	/// Sends an authorized request and decodes a successful JSON body.
	pub async fn send_json<R>(&self, operation: &'static str, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let response = self.send(request).await?;

		Ok(expect_success(&response, operation)?.json(operation)?)
	}

	/// Returns a snapshot of the stored session.
	pub async fn session(&self) -> Result<Option<SessionRecord>> {
		Ok(self.store.fetch().await?)
	}

	/// Waits for a refreshed access token, leading the refresh when none is running.
	pub(crate) async fn await_refresh(&self) -> Result<TokenSecret> {
		let (pending, ticket) = self.coordinator.enlist();

		match ticket {
			Some(ticket) => self.lead_refresh(ticket).await,
			None => self.refresh_metrics.record_queued(),
		}

		pending.await.map_err(Error::RefreshFailed)
	}

	/// Picks the retry token for a request sent at `epoch` with `sent_with` that got a 401.
	async fn recover(&self, epoch: u64, sent_with: Option<&TokenSecret>) -> Result<TokenSecret> {
		let pending = match self.coordinator.enlist_since(epoch, sent_with) {
			Enlistment::Fresh(token) => return Ok(token),
			Enlistment::Follower(pending) => {
				self.refresh_metrics.record_queued();

				pending
			},
			Enlistment::Leader(pending, ticket) => {
				self.lead_refresh(ticket).await;

				pending
			},
		};

		pending.await.map_err(Error::RefreshFailed)
	}

	async fn lead_refresh(&self, ticket: RefreshTicket<'_>) {
		#[cfg(feature = "tracing")]
		tracing::debug!("access token rejected; refreshing session");

		let span = CallSpan::refresh_cycle(self.config.refresh_credential);

		match span.instrument(self.perform_refresh()).await {
			Ok(token) => {
				self.refresh_metrics.record_success();

				let settled = ticket.resolve(token);

				span.record_settled(CallOutcome::Success, settled);
				obs::record_refresh_cycle(CallOutcome::Success, settled);
			},
			Err(failure) => {
				self.refresh_metrics.record_failure();

				#[cfg(feature = "tracing")]
				tracing::warn!(
					status = ?failure.status,
					error = %failure,
					"session refresh failed"
				);

				if let Err(e) = self.store.purge_credentials().await {
					#[cfg(feature = "tracing")]
					tracing::warn!(error = %e, "failed to purge session credentials");
					#[cfg(not(feature = "tracing"))]
					let _ = e;
				}

				self.transport.forget_credentials();
				self.navigator.redirect_to_login(&self.config.login_path);

				let settled = ticket.reject(failure);

				span.record_settled(CallOutcome::Failure, settled);
				obs::record_refresh_cycle(CallOutcome::Failure, settled);
			},
		}
	}

	async fn perform_refresh(&self) -> Result<TokenSecret, RefreshFailure> {
		self.refresh_metrics.record_attempt();

		let authorization = match self.config.refresh_credential {
			RefreshCredential::StoredBearer => {
				let record = self
					.store
					.fetch()
					.await
					.map_err(|e| RefreshFailure::new(e.to_string()))?;
				let token = record
					.and_then(|record| record.refresh_token)
					.filter(|token| !token.is_blank())
					.ok_or_else(|| RefreshFailure::new("No refresh token is stored"))?;

				Some(token.bearer())
			},
			RefreshCredential::Cookie => None,
		};
		let outbound = self
			.outbound(&ApiRequest::post(REFRESH_PATH), authorization)
			.map_err(|e| RefreshFailure::new(e.to_string()))?;
		let response = self
			.transport
			.execute(outbound)
			.await
			.map_err(|e| RefreshFailure::new(e.to_string()))?;

		if !response.is_success() {
			let error = response.to_api_error(REFRESH_OPERATION);

			return Err(RefreshFailure::new(error.message).with_status(response.status));
		}

		let grant: RefreshGrant = response
			.json(REFRESH_OPERATION)
			.map_err(|e| RefreshFailure::new(e.to_string()).with_status(response.status))?;
		let token = grant
			.access_token
			.filter(|token| !token.is_blank())
			.ok_or_else(|| {
				RefreshFailure::new(DecodeError::MissingAccessToken.to_string())
					.with_status(response.status)
			})?;

		let rotation = self
			.store
			.rotate_access_token(token.clone())
			.await
			.map_err(|e| RefreshFailure::new(e.to_string()))?;

		if rotation == AccessRotation::Missing {
			return Err(RefreshFailure::new("Session ended while the refresh was in flight"));
		}

		Ok(token)
	}

	async fn dispatch(
		&self,
		request: &ApiRequest,
		record: Option<&SessionRecord>,
	) -> Result<ApiResponse> {
		let mut outbound = self.outbound(request, None)?;

		if let Some(record) = record {
			let Ok(signed) = self.signer.attach_session(outbound, record);

			outbound = signed;
		}

		Ok(self.transport.execute(outbound).await?)
	}

	fn outbound(
		&self,
		request: &ApiRequest,
		authorization: Option<String>,
	) -> Result<OutboundRequest, ConfigError> {
		let mut url = self.config.endpoint(&request.path)?;

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(request.query.iter());
		}

		Ok(OutboundRequest {
			method: request.method,
			url,
			path: request.path.clone(),
			authorization,
			body: request.body.clone(),
		})
	}
}
#[cfg(feature = "reqwest")]
impl SessionClient<ReqwestHttpClient> {
	/// Creates a client with its own reqwest transport and refresh coordinator.
	pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Self {
		Self::with_transport(config, store, Default::default(), ReqwestHttpClient::default())
	}
}
impl<T> Clone for SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			coordinator: self.coordinator.clone(),
			navigator: self.navigator.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			signer: self.signer,
		}
	}
}
impl<T> Debug for SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_credential", &self.config.refresh_credential)
			.field("refreshing", &self.coordinator.is_refreshing())
			.finish()
	}
}

/// Maps a non-success response to [`Error::Api`].
pub(crate) fn expect_success<'a>(
	response: &'a ApiResponse,
	operation: &'static str,
) -> Result<&'a ApiResponse> {
	if response.is_success() {
		Ok(response)
	} else {
		Err(response.to_api_error(operation).into())
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		error::TransportError,
		http::{ApiBody, HttpMethod, TransportFuture},
		store::MemoryStore,
	};

	#[derive(Default)]
	struct Scripted {
		seen: Mutex<Vec<OutboundRequest>>,
		replies: Mutex<Vec<ApiResponse>>,
		forgotten: AtomicUsize,
	}
	impl Scripted {
		fn replying(replies: Vec<ApiResponse>) -> Self {
			Self { replies: Mutex::new(replies), ..Default::default() }
		}

		fn forgotten(&self) -> usize {
			self.forgotten.load(Ordering::SeqCst)
		}
	}
	impl ApiTransport for Scripted {
		fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
			self.seen.lock().push(request);

			let reply = self.replies.lock().remove(0);

			Box::pin(async move { Ok::<_, TransportError>(reply) })
		}

		fn forget_credentials(&self) {
			self.forgotten.fetch_add(1, Ordering::SeqCst);
		}
	}

	/// Rejects every API call and logs the user out while the refresh is on the wire.
	struct LogoutMidRefresh {
		store: Arc<MemoryStore>,
		calls: AtomicUsize,
	}
	impl ApiTransport for LogoutMidRefresh {
		fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Box::pin(async move {
				if request.path != REFRESH_PATH {
					return Ok::<_, TransportError>(ApiResponse::new(
						401,
						r#"{"error":"Invalid token"}"#,
					));
				}

				self.store.clear().await.expect("Clearing the store should succeed.");

				Ok(ApiResponse::new(200, r#"{"access_token":"T2"}"#))
			})
		}
	}

	fn config() -> ClientConfig {
		ClientConfig::builder()
			.base_url(Url::parse("http://api.test/api/v1/").expect("Fixture URL should parse."))
			.build()
			.expect("Config should build.")
	}

	fn client(transport: Scripted, record: SessionRecord) -> SessionClient<Scripted> {
		SessionClient::with_transport(
			config(),
			Arc::new(MemoryStore::with_record(record)),
			Default::default(),
			transport,
		)
	}

	fn refresh_to(coordinator: &RefreshCoordinator, token: &str) {
		let (_, leader) = coordinator.enlist();

		leader.expect("Idle coordinator should lead.").resolve(TokenSecret::new(token));
	}

	fn assert_refresh_failed(result: Result<TokenSecret>, message: &str) {
		match result {
			Err(Error::RefreshFailed(failure)) => assert_eq!(failure.message, message),
			other => panic!("Expected a failed refresh, got {other:?}."),
		}
	}

	#[tokio::test]
	async fn outbound_carries_query_and_bearer() {
		let transport = Scripted::replying(vec![ApiResponse::new(200, "{}")]);
		let client = client(transport, SessionRecord::default().with_access_token("T1"));
		let response = client
			.send(ApiRequest::get("projects").with_query("page", 2).with_query("search", "a b"))
			.await
			.expect("Request should succeed.");

		assert_eq!(response.status, 200);

		let seen = client.transport.seen.lock();

		assert_eq!(seen[0].method, HttpMethod::Get);
		assert_eq!(seen[0].url.as_str(), "http://api.test/api/v1/projects?page=2&search=a+b");
		assert_eq!(seen[0].authorization.as_deref(), Some("Bearer T1"));
	}

	#[tokio::test]
	async fn missing_refresh_token_fails_without_calling_refresh() {
		let transport = Scripted::replying(vec![ApiResponse::new(401, "{}")]);
		let client = client(transport, SessionRecord::default().with_access_token("T1"));
		let err = client
			.send(ApiRequest::get("auth/user-info"))
			.await
			.expect_err("Refresh without a refresh token should fail.");

		assert!(matches!(err, Error::RefreshFailed(_)));
		assert_eq!(client.transport.seen.lock().len(), 1);
		assert_eq!(client.refresh_metrics.failures(), 1);

		let record = client.session().await.expect("Store should be readable.");

		assert_eq!(record.and_then(|record| record.access_token), None);
	}

	#[tokio::test]
	async fn late_unauthorized_reuses_finished_refresh() {
		let transport = Scripted::default();
		let client = client(transport, SessionRecord::default().with_access_token("T1"));
		let sent_at = client.coordinator.epoch();
		let (pending, leader) = client.coordinator.enlist();

		leader.expect("First enlistment should lead.").resolve(TokenSecret::new("T2"));
		pending.await.expect("Leader handle should resolve.");

		let token = client
			.recover(sent_at, Some(&TokenSecret::new("T1")))
			.await
			.expect("Token from the finished refresh should be reused.");

		assert_eq!(token.expose(), "T2");
		assert_eq!(client.refresh_metrics.attempts(), 0);
		assert!(client.transport.seen.lock().is_empty());
	}

	#[tokio::test]
	async fn failed_refresh_stops_late_unauthorized_reuse() {
		let client = client(Scripted::default(), SessionRecord::default().with_access_token("T1"));
		let sent_at = client.coordinator.epoch();

		refresh_to(&client.coordinator, "T2");

		let (_, leader) = client.coordinator.enlist();

		leader.expect("Idle coordinator should lead.").reject(RefreshFailure::new("dead"));

		let result = client.recover(sent_at, Some(&TokenSecret::new("T1"))).await;

		assert_refresh_failed(result, "No refresh token is stored");
		assert!(client.transport.seen.lock().is_empty());
		assert_eq!(client.transport.forgotten(), 1);
	}

	#[tokio::test]
	async fn logout_stops_late_unauthorized_reuse() {
		let client = client(
			Scripted::default(),
			SessionRecord::for_login("aquamarine").with_access_token("T1").with_refresh_token("R1"),
		);
		let sent_at = client.coordinator.epoch();

		refresh_to(&client.coordinator, "T2");
		client.logout().await.expect("Logout should succeed.");

		assert_eq!(client.transport.forgotten(), 1);

		let result = client.recover(sent_at, Some(&TokenSecret::new("T1"))).await;

		assert_refresh_failed(result, "No refresh token is stored");
		assert!(client.transport.seen.lock().is_empty());
		assert_eq!(client.session().await.expect("Store should be readable."), None);
	}

	#[tokio::test]
	async fn refresh_finishing_after_logout_keeps_store_empty() {
		let store = Arc::new(MemoryStore::with_record(
			SessionRecord::for_login("aquamarine").with_access_token("T1").with_refresh_token("R1"),
		));
		let transport = LogoutMidRefresh { store: store.clone(), calls: AtomicUsize::new(0) };
		let shared_store: Arc<dyn SessionStore> = store.clone();
		let client =
			SessionClient::with_transport(config(), shared_store, Default::default(), transport);
		let err = client
			.send(ApiRequest::get("projects"))
			.await
			.expect_err("A refresh landing after logout should fail.");

		assert!(matches!(
			err,
			Error::RefreshFailed(ref failure)
				if failure.message == "Session ended while the refresh was in flight"
		));
		assert!(store.snapshot().is_none());
		// Initial call plus refresh; the request is not replayed.
		assert_eq!(client.transport.calls.load(Ordering::SeqCst), 2);
		assert!(matches!(
			client.coordinator.enlist_since(0, Some(&TokenSecret::new("T1"))),
			Enlistment::Leader(..)
		));
	}

	#[test]
	fn expect_success_maps_backend_error() {
		let response = ApiResponse::new(404, r#"{"error":"Project not found"}"#);
		let err = expect_success(&response, "Project lookup").expect_err("404 should fail.");

		assert!(matches!(err, Error::Api(ref api) if api.status == 404));
		assert_eq!(err.to_string(), "Project lookup failed with HTTP 404: Project not found.");
	}

	#[test]
	fn refresh_request_has_no_body() {
		let client = client(Scripted::default(), SessionRecord::default());
		let outbound = client
			.outbound(&ApiRequest::post(REFRESH_PATH), Some("Bearer R1".into()))
			.expect("Refresh endpoint should resolve.");

		assert_eq!(outbound.body, ApiBody::Empty);
		assert_eq!(outbound.url.as_str(), "http://api.test/api/v1/auth/refresh");
	}
}
