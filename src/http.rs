//! Transport primitives for API calls.
//!
//! [`ApiTransport`] is the client's only dependency on an HTTP stack. The client resolves
//! an [`ApiRequest`] against its base URL, attaches the bearer header, and hands the
//! resulting [`OutboundRequest`] to the transport, which returns a fully buffered
//! [`ApiResponse`]. Non-2xx statuses are responses, not transport errors; the client
//! decides what a 401 means.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	header::{AUTHORIZATION, HeaderMap, RETRY_AFTER},
	multipart::{Form, Part},
};
#[cfg(feature = "cookies")]
use reqwest::{
	cookie::{CookieStore, Jar},
	header::HeaderValue,
};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`ApiTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing API calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// clone of a client, and their futures must be `Send` so callers can spawn requests onto
/// multi-threaded executors.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the response.
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_>;

	/// Drops credentials the transport holds for the session, such as refresh cookies.
	///
	/// Called after logout and after a failed refresh. Stateless transports keep the default.
	fn forget_credentials(&self) {}
}

/// Fully resolved request handed to a transport.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundRequest {
	/// HTTP method.
	pub method: HttpMethod,
	/// Absolute URL including the query string.
	pub url: Url,
	/// Path relative to the base URL, for error reporting.
	pub path: String,
	/// `Authorization` header value, if any.
	pub authorization: Option<String>,
	/// Body.
	pub body: ApiBody,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	#[cfg(feature = "cookies")]
	jar: Option<Arc<SessionJar>>,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// Cookies kept by `client` are outside this wrapper's reach and survive
	/// [`ApiTransport::forget_credentials`]; use [`Self::with_cookie_store`] for cookie sessions.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self {
			client,
			#[cfg(feature = "cookies")]
			jar: None,
		}
	}

	/// Builds a client that keeps cookies between calls, for cookie-carried refresh credentials.
	///
	/// The jar is emptied whenever the session ends, so a purged session cannot be refreshed
	/// through a leftover cookie.
	#[cfg(feature = "cookies")]
	pub fn with_cookie_store() -> Result<Self, crate::error::ConfigError> {
		let jar = Arc::new(SessionJar::default());
		let client = ReqwestClient::builder().cookie_provider(jar.clone()).build()?;

		Ok(Self { client, jar: Some(jar) })
	}

	/// Returns the cookie jar, when this client keeps one.
	#[cfg(feature = "cookies")]
	pub fn jar(&self) -> Option<&Arc<SessionJar>> {
		self.jar.as_ref()
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestHttpClient {
	fn forget_credentials(&self) {
		#[cfg(feature = "cookies")]
		{
			if let Some(jar) = &self.jar {
				jar.clear();
			}
		}
	}

	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
		let client = self.client.clone();

		Box::pin(async move {
			let OutboundRequest { method, url, path, authorization, body } = request;
			let mut builder = client.request(method.into(), url);

			if let Some(value) = authorization {
				builder = builder.header(AUTHORIZATION, value);
			}

			builder = match body {
				ApiBody::Empty => builder,
				ApiBody::Json(value) => builder.json(&value),
				ApiBody::Multipart(form) => builder.multipart(build_form(&path, form)?),
			};

			let response =
				builder.send().await.map_err(|e| TransportError::network(path.as_str(), e))?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response
				.bytes()
				.await
				.map_err(|e| TransportError::network(path.as_str(), e))?
				.to_vec();

			Ok(ApiResponse { status, retry_after, body })
		})
	}
}

/// Cookie jar that can be emptied when the session ends.
#[cfg(feature = "cookies")]
#[derive(Debug, Default)]
pub struct SessionJar(RwLock<Jar>);
#[cfg(feature = "cookies")]
impl SessionJar {
	/// Stores a `Set-Cookie` style string as if `url` had sent it.
	pub fn add_cookie_str(&self, cookie: &str, url: &Url) {
		self.0.read().add_cookie_str(cookie, url);
	}

	/// Drops every cookie.
	pub fn clear(&self) {
		*self.0.write() = Jar::default();
	}
}
#[cfg(feature = "cookies")]
impl CookieStore for SessionJar {
	fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
		self.0.read().set_cookies(cookie_headers, url);
	}

	fn cookies(&self, url: &Url) -> Option<HeaderValue> {
		self.0.read().cookies(url)
	}
}

#[cfg(feature = "reqwest")]
fn build_form(path: &str, form: MultipartForm) -> Result<Form, TransportError> {
	let mut out = Form::new();

	for (name, value) in form.fields {
		out = out.text(name, value);
	}
	for file in form.files {
		let mut part = Part::bytes(file.bytes).file_name(file.file_name);

		if let Some(content_type) = file.content_type {
			part = part.mime_str(&content_type).map_err(|e| TransportError::request(path, e))?;
		}

		out = out.part(file.field, part);
	}

	Ok(out)
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	#[test]
	fn retry_after_accepts_delta_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(12)));
	}

	#[test]
	fn retry_after_ignores_past_dates_and_garbage() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn multipart_rejects_bad_mime() {
		let form = MultipartForm::default()
			.text("title", "Bridge")
			.file(FilePart::new("image", "a.png", vec![0]).with_content_type("not a mime"));

		assert!(matches!(build_form("projects", form), Err(TransportError::Request { .. })));
	}

	#[cfg(feature = "cookies")]
	#[test]
	fn forgetting_credentials_empties_the_cookie_jar() {
		let client = ReqwestHttpClient::with_cookie_store().expect("Cookie client should build.");
		let jar = client.jar().expect("Cookie client should keep a jar.").clone();
		let url = Url::parse("http://localhost:3000/api/v1/auth/refresh")
			.expect("Fixture URL should parse.");

		jar.add_cookie_str("refresh_token=R1; Path=/", &url);

		assert!(jar.cookies(&url).is_some());

		client.forget_credentials();

		assert!(jar.cookies(&url).is_none());
	}

	#[test]
	fn plain_clients_forget_nothing() {
		ReqwestHttpClient::default().forget_credentials();
	}
}
