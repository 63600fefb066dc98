//! Typed calls for the defect tracker's REST surface.
//!
//! Every call is an inherent method on [`SessionClient`](crate::client::SessionClient):
//! [`auth`] holds the public login/registration calls and the session helpers, while
//! [`projects`] and [`defects`] run through the authorized refresh-and-retry path.

pub mod auth;
pub mod defects;
pub mod projects;

pub use auth::*;
pub use defects::*;
pub use projects::*;

// crates.io
use serde::Deserializer;
// self
use crate::_prelude::*;

/// Acknowledgement body returned by mutating endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
	/// Human-readable confirmation.
	#[serde(default)]
	pub message: String,
}

/// Page metadata attached to list responses.
///
/// Project listings spell the page count `totalPages` and defect listings `total_pages`;
/// both decode into [`Pagination::total_pages`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
	/// Current page, 1-based.
	#[serde(default)]
	pub page: Option<u32>,
	/// Page size.
	#[serde(default)]
	pub limit: Option<u32>,
	/// Total number of matching items.
	#[serde(default)]
	pub total: Option<u64>,
	/// Number of pages.
	#[serde(default, rename = "totalPages", alias = "total_pages")]
	pub total_pages: u64,
}
impl Pagination {
	/// Returns `true` when a page after the current one exists.
	pub fn has_next(&self) -> bool {
		self.page.is_some_and(|page| u64::from(page) < self.total_pages)
	}
}

/// Decodes `null` as the type's default; the backend renders empty slices as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn pagination_accepts_both_spellings() {
		let projects: Pagination =
			serde_json::from_str(r#"{"page":1,"limit":4,"total":9,"totalPages":3}"#)
				.expect("Project pagination should decode.");
		let defects: Pagination = serde_json::from_str(r#"{"total_pages":2}"#)
			.expect("Defect pagination should decode.");

		assert_eq!(projects.total_pages, 3);
		assert!(projects.has_next());
		assert_eq!(defects.total_pages, 2);
		assert!(!defects.has_next());
	}
}
