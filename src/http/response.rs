//! Buffered responses and their mapping onto API errors.

// self
use crate::{
	_prelude::*,
	error::{ApiError, DecodeError},
};

/// Fully buffered HTTP response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response with the given status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, retry_after: None, body: body.into() }
	}

	/// Creates a response whose body is the serialized `value`.
	pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
		Self::new(status, value.to_string())
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` for HTTP 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self, operation: &'static str) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|source| DecodeError::Json {
			operation,
			source,
			status: self.status,
		})
	}

	/// Returns the backend's `error` field, if the body carries one.
	pub fn error_message(&self) -> Option<String> {
		let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;

		value.get("error")?.as_str().map(str::to_owned)
	}

	/// Converts a non-success response into an [`ApiError`].
	pub fn to_api_error(&self, operation: &'static str) -> ApiError {
		ApiError {
			operation,
			status: self.status,
			message: self.error_message().unwrap_or_else(|| format!("{operation} failed")),
			retry_after: self.retry_after,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn error_message_prefers_backend_text() {
		let response = ApiResponse::new(409, r#"{"error":"User with this login already exists"}"#);
		let error = response.to_api_error("Registration");

		assert_eq!(error.status, 409);
		assert_eq!(error.message, "User with this login already exists");

		let opaque = ApiResponse::new(502, "<html>bad gateway</html>").to_api_error("Login");

		assert_eq!(opaque.message, "Login failed");
	}

	#[test]
	fn json_reports_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Page {
			#[allow(dead_code)]
			pagination: Pagination,
		}
		#[derive(Debug, Deserialize)]
		struct Pagination {
			#[allow(dead_code)]
			total: u64,
		}

		let response = ApiResponse::new(200, r#"{"pagination":{"total":"many"}}"#);
		let err = response.json::<Page>("Project listing").expect_err("Bad payload should fail.");

		match err {
			DecodeError::Json { source, status, .. } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "pagination.total");
			},
			other => panic!("Unexpected decode error: {other:?}."),
		}
	}
}
