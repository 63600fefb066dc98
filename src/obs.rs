//! Optional observability helpers for client calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_session.call` with the `call`
//!   (operation) and `stage` (call site) fields. Each refresh cycle gets its own
//!   `bearer_session.refresh` span carrying the credential mode, the outcome, and the number
//!   of queued requests it settled.
//! - Enable `metrics` to increment the `bearer_session_call_total` counter for every
//!   attempt/success/failure, labeled by `call` + `outcome`, and to record refresh cycles in
//!   `bearer_session_refresh_total` and `bearer_session_refresh_settled`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client operations observed by the instrumentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Account registration.
	Register,
	/// Password login.
	Login,
	/// Access-token refresh.
	Refresh,
	/// Current user lookup.
	UserInfo,
	/// Session teardown.
	Logout,
	/// Project listing, lookup, creation, and updates.
	Projects,
	/// Defect listing, lookup, creation, and deletion.
	Defects,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Register => "register",
			CallKind::Login => "login",
			CallKind::Refresh => "refresh",
			CallKind::UserInfo => "user_info",
			CallKind::Logout => "logout",
			CallKind::Projects => "projects",
			CallKind::Defects => "defects",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a [`CallSpan`] and records attempt plus success/failure outcomes.
pub(crate) async fn observe<T, Fut>(kind: CallKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	record_call_outcome(kind, CallOutcome::Attempt);

	let result = CallSpan::new(kind, stage).instrument(fut).await;

	match &result {
		Ok(_) => record_call_outcome(kind, CallOutcome::Success),
		Err(_) => record_call_outcome(kind, CallOutcome::Failure),
	}

	result
}
