//! Defect calls under `defects/`.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	api::{ApiMessage, Pagination, null_as_default},
	client::SessionClient,
	error::ConfigError,
	http::{ApiRequest, ApiTransport, FilePart, HttpMethod, MultipartForm},
	obs::{self, CallKind},
};

/// Workflow state of a defect, encoded as `1`..=`3` on the wire.
#[derive(
	Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum DefectStatus {
	/// Reported and not yet picked up.
	#[default]
	Open,
	/// Being worked on.
	InProgress,
	/// Fixed.
	Resolved,
}
impl DefectStatus {
	/// Returns the wire code.
	pub const fn code(self) -> u8 {
		match self {
			DefectStatus::Open => 1,
			DefectStatus::InProgress => 2,
			DefectStatus::Resolved => 3,
		}
	}
}
impl TryFrom<u8> for DefectStatus {
	type Error = DefectStatusError;

	fn try_from(code: u8) -> Result<Self, Self::Error> {
		match code {
			1 => Ok(DefectStatus::Open),
			2 => Ok(DefectStatus::InProgress),
			3 => Ok(DefectStatus::Resolved),
			other => Err(DefectStatusError(other)),
		}
	}
}
impl From<DefectStatus> for u8 {
	fn from(status: DefectStatus) -> Self {
		status.code()
	}
}

/// Status code outside the known range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown defect status {0}.")]
pub struct DefectStatusError(pub u8);

/// Defect as returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defect {
	/// Numeric identifier.
	#[serde(rename = "ID", alias = "id")]
	pub id: u64,
	/// Owning project.
	pub project_id: u64,
	/// Title.
	#[serde(default)]
	pub title: String,
	/// Free-form description.
	#[serde(default)]
	pub description: String,
	/// Workflow state.
	#[serde(default)]
	pub status: DefectStatus,
	/// Reporter's user id.
	#[serde(default)]
	pub created_by: Option<u64>,
	/// Optional due date.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub deadline: Option<OffsetDateTime>,
	/// Server-relative path of the attached image, empty when none was uploaded.
	#[serde(default)]
	pub image_url: String,
	/// Creation instant.
	#[serde(default, rename = "CreatedAt", with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
}

/// Filters for [`SessionClient::list_defects`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefectQuery {
	/// Project whose defects are listed.
	pub project_id: u64,
	/// 1-based page number.
	pub page: u32,
	/// Page size.
	pub limit: u32,
	/// Case-insensitive filter over title and description.
	pub search: String,
}
impl DefectQuery {
	/// Queries the first page of ten for `project_id`.
	pub fn for_project(project_id: u64) -> Self {
		Self { project_id, page: 1, limit: 10, search: String::new() }
	}

	/// Moves to `page`.
	pub fn page(mut self, page: u32) -> Self {
		self.page = page;

		self
	}

	/// Sets the page size.
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = limit;

		self
	}

	/// Sets the text filter.
	pub fn search(mut self, search: impl Into<String>) -> Self {
		self.search = search.into();

		self
	}

	fn to_request(&self) -> ApiRequest {
		let request = ApiRequest::get("defects")
			.with_query("project_id", self.project_id)
			.with_query("page", self.page)
			.with_query("limit", self.limit);

		if self.search.is_empty() { request } else { request.with_query("search", &self.search) }
	}
}

/// One page of defects plus per-status totals for the whole project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectPage {
	/// Defects on this page.
	#[serde(default, deserialize_with = "null_as_default")]
	pub defects: Vec<Defect>,
	/// Page metadata.
	#[serde(default)]
	pub pagination: Pagination,
	/// Defect count keyed by status code.
	#[serde(default, deserialize_with = "null_as_default")]
	pub status_counts: BTreeMap<u8, u64>,
}
impl DefectPage {
	/// Returns how many of the project's defects are in `status`.
	pub fn count(&self, status: DefectStatus) -> u64 {
		self.status_counts.get(&status.code()).copied().unwrap_or_default()
	}
}

/// Input for [`SessionClient::create_defect`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDefect {
	/// Owning project.
	pub project_id: u64,
	/// Title.
	pub title: String,
	/// Description.
	pub description: String,
	/// Optional attachment, sent as the `image` part.
	pub image: Option<FilePart>,
}
impl NewDefect {
	/// Creates a defect input without an attachment.
	pub fn new(project_id: u64, title: impl Into<String>, description: impl Into<String>) -> Self {
		Self { project_id, title: title.into(), description: description.into(), image: None }
	}

	/// Attaches an image.
	pub fn with_image(mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
		self.image = Some(FilePart::new("image", file_name, bytes));

		self
	}

	fn into_form(self) -> MultipartForm {
		let form = MultipartForm::default()
			.text("project_id", self.project_id.to_string())
			.text("title", self.title)
			.text("description", self.description);

		match self.image {
			Some(image) => form.file(image),
			None => form,
		}
	}
}

/// Partial update for [`SessionClient::update_defect`]; unset fields stay unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefectUpdate {
	/// New title.
	pub title: Option<String>,
	/// New description.
	pub description: Option<String>,
	/// New workflow state.
	pub status: Option<DefectStatus>,
	/// New due date.
	pub deadline: Option<OffsetDateTime>,
	/// Replacement image.
	pub image: Option<FilePart>,
}
impl DefectUpdate {
	/// Sets the title.
	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());

		self
	}

	/// Sets the description.
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Moves the defect to `status`.
	pub fn status(mut self, status: DefectStatus) -> Self {
		self.status = Some(status);

		self
	}

	/// Sets the due date.
	pub fn deadline(mut self, deadline: OffsetDateTime) -> Self {
		self.deadline = Some(deadline);

		self
	}

	fn into_form(self) -> Result<MultipartForm, ConfigError> {
		let mut form = MultipartForm::default();

		if let Some(title) = self.title {
			form = form.text("title", title);
		}
		if let Some(description) = self.description {
			form = form.text("description", description);
		}
		if let Some(status) = self.status {
			form = form.text("status", status.code().to_string());
		}
		if let Some(deadline) = self.deadline {
			form = form.text("deadline", deadline.format(&Rfc3339)?);
		}
		if let Some(image) = self.image {
			form = form.file(image);
		}

		Ok(form)
	}
}

/// Response to defect creation and updates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectChange {
	/// Confirmation.
	#[serde(default)]
	pub message: String,
	/// Defect state, absent when an update changed nothing.
	#[serde(default)]
	pub defect: Option<Defect>,
}

#[derive(Deserialize)]
struct DefectEnvelope {
	defect: Defect,
}

impl<T> SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Lists a project's defects with per-status totals.
	pub async fn list_defects(&self, query: &DefectQuery) -> Result<DefectPage> {
		obs::observe(CallKind::Defects, "list_defects", async {
			self.send_json("Defect listing", query.to_request()).await
		})
		.await
	}

	/// Fetches one defect.
	pub async fn defect(&self, id: u64) -> Result<Defect> {
		obs::observe(CallKind::Defects, "defect", async {
			let envelope: DefectEnvelope =
				self.send_json("Defect lookup", ApiRequest::get(format!("defects/{id}"))).await?;

			Ok(envelope.defect)
		})
		.await
	}

	/// Reports a defect, uploading its image when present.
	pub async fn create_defect(&self, defect: NewDefect) -> Result<DefectChange> {
		obs::observe(CallKind::Defects, "create_defect", async {
			let call = ApiRequest::post("defects").with_multipart(defect.into_form());

			self.send_json("Defect creation", call).await
		})
		.await
	}

	/// Applies a partial update to a defect.
	pub async fn update_defect(&self, id: u64, update: DefectUpdate) -> Result<DefectChange> {
		obs::observe(CallKind::Defects, "update_defect", async {
			let call = ApiRequest::new(HttpMethod::Patch, format!("defects/{id}"))
				.with_multipart(update.into_form()?);

			self.send_json("Defect update", call).await
		})
		.await
	}

	/// Deletes a defect permanently.
	pub async fn delete_defect(&self, id: u64) -> Result<ApiMessage> {
		obs::observe(CallKind::Defects, "delete_defect", async {
			self.send_json("Defect deletion", ApiRequest::delete(format!("defects/{id}"))).await
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn page_decodes_status_counts_and_snake_case_pagination() {
		let page: DefectPage = serde_json::from_str(
			r#"{
				"defects": [{"ID": 4, "project_id": 7, "title": "Crack", "status": 2}],
				"pagination": {"page": 1, "limit": 10, "total": 1, "total_pages": 1},
				"status_counts": {"1": 3, "2": 1}
			}"#,
		)
		.expect("Defect page should decode.");

		assert_eq!(page.defects[0].status, DefectStatus::InProgress);
		assert_eq!(page.pagination.total_pages, 1);
		assert_eq!(page.count(DefectStatus::Open), 3);
		assert_eq!(page.count(DefectStatus::Resolved), 0);
	}

	#[test]
	fn unknown_status_is_rejected() {
		let err = serde_json::from_str::<Defect>(r#"{"ID": 1, "project_id": 1, "status": 9}"#)
			.expect_err("Status 9 should be rejected.");

		assert!(err.to_string().contains("Unknown defect status 9"));
	}

	#[test]
	fn query_omits_empty_search() {
		let request = DefectQuery::for_project(7).page(2).to_request();

		assert_eq!(
			request.query,
			vec![
				("project_id".to_owned(), "7".to_owned()),
				("page".to_owned(), "2".to_owned()),
				("limit".to_owned(), "10".to_owned()),
			]
		);
	}

	#[test]
	fn update_form_encodes_status_and_deadline() {
		let form = DefectUpdate::default()
			.status(DefectStatus::Resolved)
			.deadline(macros::datetime!(2025-06-01 12:00 UTC))
			.into_form()
			.expect("Update form should build.");

		assert_eq!(
			form.fields,
			vec![
				("status".to_owned(), "3".to_owned()),
				("deadline".to_owned(), "2025-06-01T12:00:00Z".to_owned()),
			]
		);
	}
}
