//! Client-level error types shared across the transport, store, and API layers.

// self
use crate::{_prelude::*, refresh::RefreshFailure};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Backend answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// Request was rejected with 401 again after being retried with a fresh token.
	#[error("Request to `{path}` is still unauthorized after a token refresh.")]
	Unauthorized {
		/// Path of the rejected request.
		path: String,
	},
	/// The shared token refresh failed; the session has been purged.
	#[error("Session refresh failed: {0}.")]
	RefreshFailed(RefreshFailure),
}

/// Configuration and validation failures raised while assembling a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed or cannot carry paths.
	#[error("Base URL `{url}` is invalid.")]
	InvalidBaseUrl {
		/// Offending input.
		url: String,
		/// Underlying parsing failure, when one exists.
		#[source]
		source: Option<url::ParseError>,
	},
	/// A request path could not be joined onto the base URL.
	#[error("Request path `{path}` is invalid.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Login path must be absolute.
	#[error("Login path `{0}` must start with `/`.")]
	InvalidLoginPath(String),
	/// Environment variable holds an unsupported value.
	#[error("Environment variable `{name}` has unsupported value `{value}`.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Raw value.
		value: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Body(#[from] serde_json::Error),
	/// Timestamp field could not be rendered as RFC 3339.
	#[error("Timestamp could not be formatted.")]
	Timestamp(#[from] time::error::Format),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling `{path}`.")]
	Network {
		/// Path of the failed request.
		path: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request could not be assembled by the transport (for example a bad multipart part).
	#[error("Request to `{path}` could not be built.")]
	Request {
		/// Path of the failed request.
		path: String,
		/// Transport-specific builder error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(path: impl Into<String>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { path: path.into(), source: Box::new(src) }
	}

	/// Wraps a transport-specific request construction error.
	pub fn request(path: impl Into<String>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Request { path: path.into(), source: Box::new(src) }
	}
}

/// Response body decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Backend responded with malformed or unexpected JSON.
	#[error("{operation} returned malformed JSON.")]
	Json {
		/// Operation label.
		operation: &'static str,
		/// Structured parsing failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Refresh response did not carry an access token.
	#[error("Refresh response is missing access_token.")]
	MissingAccessToken,
}

/// Non-success response returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{operation} failed with HTTP {status}: {message}.")]
pub struct ApiError {
	/// Operation label.
	pub operation: &'static str,
	/// HTTP status code.
	pub status: u16,
	/// Backend-supplied `error` field or a generic fallback.
	pub message: String,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "disk unplugged".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk unplugged"));

		let source = StdError::source(&error)
			.expect("Client error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn api_error_display_includes_status_and_message() {
		let error = Error::from(ApiError {
			operation: "Login",
			status: 401,
			message: "Invalid login or password".into(),
			retry_after: None,
		});

		assert_eq!(error.to_string(), "Login failed with HTTP 401: Invalid login or password.");
	}
}
