//! Clonable request descriptions, so a 401'd call can be re-dispatched verbatim.

// self
use crate::{_prelude::*, error::ConfigError};

/// HTTP methods used by the API surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl HttpMethod {
	/// Returns the method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Patch => "PATCH",
			HttpMethod::Delete => "DELETE",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<HttpMethod> for reqwest::Method {
	fn from(method: HttpMethod) -> Self {
		match method {
			HttpMethod::Get => reqwest::Method::GET,
			HttpMethod::Post => reqwest::Method::POST,
			HttpMethod::Put => reqwest::Method::PUT,
			HttpMethod::Patch => reqwest::Method::PATCH,
			HttpMethod::Delete => reqwest::Method::DELETE,
		}
	}
}

/// A file attached to a multipart body.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
	/// Form field name.
	pub field: String,
	/// File name reported to the server.
	pub file_name: String,
	/// MIME type, if known.
	pub content_type: Option<String>,
	/// File contents.
	pub bytes: Vec<u8>,
}
impl FilePart {
	/// Creates a part for `field` carrying `bytes` under `file_name`.
	pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
		Self { field: field.into(), file_name: file_name.into(), content_type: None, bytes }
	}

	/// Sets the MIME type.
	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());

		self
	}
}
impl Debug for FilePart {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FilePart")
			.field("field", &self.field)
			.field("file_name", &self.file_name)
			.field("content_type", &self.content_type)
			.field("len", &self.bytes.len())
			.finish()
	}
}

/// Multipart body kept as plain data until dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartForm {
	/// Text fields in insertion order.
	pub fields: Vec<(String, String)>,
	/// File parts in insertion order.
	pub files: Vec<FilePart>,
}
impl MultipartForm {
	/// Adds a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.fields.push((name.into(), value.into()));

		self
	}

	/// Adds a file part.
	pub fn file(mut self, part: FilePart) -> Self {
		self.files.push(part);

		self
	}
}

/// Request body variants.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ApiBody {
	/// No body.
	#[default]
	Empty,
	/// JSON document.
	Json(serde_json::Value),
	/// `multipart/form-data`.
	Multipart(MultipartForm),
}

/// Request relative to the configured base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: HttpMethod,
	/// Path relative to the base URL, without a leading slash.
	pub path: String,
	/// Query parameters in insertion order.
	pub query: Vec<(String, String)>,
	/// Body.
	pub body: ApiBody,
	retried: bool,
}
impl ApiRequest {
	/// Creates a request with no query and no body.
	pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
		let path = path.into();

		Self {
			method,
			path: path.trim_start_matches('/').to_owned(),
			query: Vec::new(),
			body: ApiBody::Empty,
			retried: false,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(HttpMethod::Get, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(HttpMethod::Post, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(HttpMethod::Put, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(HttpMethod::Delete, path)
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((name.into(), value.to_string()));

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn with_json<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = ApiBody::Json(serde_json::to_value(body)?);

		Ok(self)
	}

	/// Uses `form` as the multipart payload.
	pub fn with_multipart(mut self, form: MultipartForm) -> Self {
		self.body = ApiBody::Multipart(form);

		self
	}

	/// Returns `true` once the request has been re-sent after a 401.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	/// Marks the request as re-sent so a second 401 is not retried again.
	pub fn mark_retried(&mut self) {
		self.retried = true;
	}
}
