//! Project calls under `projects/`.

// self
use crate::{
	_prelude::*,
	api::{Defect, Pagination, null_as_default},
	client::SessionClient,
	http::{ApiRequest, ApiTransport, FilePart, MultipartForm},
	obs::{self, CallKind},
};

/// Project as returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
	/// Numeric identifier.
	#[serde(rename = "ID", alias = "id")]
	pub id: u64,
	/// Title.
	#[serde(default)]
	pub title: String,
	/// Free-form description.
	#[serde(default)]
	pub description: String,
	/// Server-relative path of the cover image, empty when none was uploaded.
	#[serde(default)]
	pub image_url: String,
	/// Owner id, when the backend includes it.
	#[serde(default)]
	pub user_id: Option<u64>,
	/// Creation instant.
	#[serde(default, rename = "CreatedAt", with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Defects preloaded with the project, if any.
	#[serde(default, deserialize_with = "null_as_default")]
	pub defects: Vec<Defect>,
}

/// Filters for [`SessionClient::list_projects`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectQuery {
	/// 1-based page number.
	pub page: u32,
	/// Page size.
	pub limit: u32,
	/// Case-insensitive title filter; empty matches everything.
	pub search: String,
}
impl ProjectQuery {
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

	/// Sets the title filter.
	pub fn search(mut self, search: impl Into<String>) -> Self {
		self.search = search.into();

		self
	}

	fn to_request(&self) -> ApiRequest {
		ApiRequest::get("projects")
			.with_query("page", self.page)
			.with_query("limit", self.limit)
			.with_query("search", &self.search)
	}
}
impl Default for ProjectQuery {
	fn default() -> Self {
		Self { page: 1, limit: 4, search: String::new() }
	}
}

/// One page of projects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPage {
	/// Projects on this page.
	#[serde(default, deserialize_with = "null_as_default")]
	pub projects: Vec<Project>,
	/// Page metadata.
	#[serde(default)]
	pub pagination: Pagination,
}

/// Input for [`SessionClient::create_project`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProject {
	/// Title; the backend requires at least three characters.
	pub title: String,
	/// Description.
	pub description: String,
	/// Optional cover image, sent as the `image` part.
	pub image: Option<FilePart>,
}
impl NewProject {
	/// Creates a project input without an image.
	pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
		Self { title: title.into(), description: description.into(), image: None }
	}

	/// Attaches a cover image.
	pub fn with_image(mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
		self.image = Some(FilePart::new("image", file_name, bytes));

		self
	}

	fn into_form(self) -> MultipartForm {
		let form = MultipartForm::default()
			.text("title", self.title)
			.text("description", self.description);

		match self.image {
			Some(image) => form.file(image),
			None => form,
		}
	}
}

/// Partial update for [`SessionClient::update_project`]; unset fields stay unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
	/// New title.
	pub title: Option<String>,
	/// New description.
	pub description: Option<String>,
	/// Replacement cover image.
	pub image: Option<FilePart>,
}
impl ProjectUpdate {
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

	/// Replaces the cover image.
	pub fn image(mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
		self.image = Some(FilePart::new("image", file_name, bytes));

		self
	}

	fn into_form(self) -> MultipartForm {
		let mut form = MultipartForm::default();

		if let Some(title) = self.title {
			form = form.text("title", title);
		}
		if let Some(description) = self.description {
			form = form.text("description", description);
		}
		if let Some(image) = self.image {
			form = form.file(image);
		}

		form
	}
}

/// Response to [`SessionClient::create_project`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedProject {
	/// Confirmation.
	#[serde(default)]
	pub message: String,
	/// Identifier of the new project.
	pub project_id: u64,
}

/// Response to [`SessionClient::update_project`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedProject {
	/// Confirmation.
	#[serde(default)]
	pub message: String,
	/// Project state, absent when nothing changed.
	#[serde(default)]
	pub project: Option<Project>,
}

impl<T> SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Lists the caller's projects.
	pub async fn list_projects(&self, query: &ProjectQuery) -> Result<ProjectPage> {
		obs::observe(CallKind::Projects, "list_projects", async {
			self.send_json("Project listing", query.to_request()).await
		})
		.await
	}

	/// Fetches one project.
	pub async fn project(&self, id: u64) -> Result<Project> {
		obs::observe(CallKind::Projects, "project", async {
			self.send_json("Project lookup", ApiRequest::get(format!("projects/{id}"))).await
		})
		.await
	}

	/// Creates a project, uploading its cover image when present.
	pub async fn create_project(&self, project: NewProject) -> Result<CreatedProject> {
		obs::observe(CallKind::Projects, "create_project", async {
			let call = ApiRequest::post("projects").with_multipart(project.into_form());

			self.send_json("Project creation", call).await
		})
		.await
	}

	/// Applies a partial update to a project.
	pub async fn update_project(&self, id: u64, update: ProjectUpdate) -> Result<UpdatedProject> {
		obs::observe(CallKind::Projects, "update_project", async {
			let call = ApiRequest::put(format!("projects/{id}")).with_multipart(update.into_form());

			self.send_json("Project update", call).await
		})
		.await
	}
}
