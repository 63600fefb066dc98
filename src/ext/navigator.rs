//! Hook invoked when the session is unrecoverable and the user must sign in again.

/// Receives the login entry point after a failed refresh purged the session.
pub trait LoginNavigator
where
	Self: Send + Sync,
{
	/// Navigates to `login_path`.
	fn redirect_to_login(&self, login_path: &str);
}
impl<F> LoginNavigator for F
where
	F: Fn(&str) + Send + Sync,
{
	fn redirect_to_login(&self, login_path: &str) {
		self(login_path)
	}
}

/// Navigator for headless callers; the purged session and the returned error are the signal.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNavigator;
impl LoginNavigator for NullNavigator {
	fn redirect_to_login(&self, login_path: &str) {
		#[cfg(feature = "tracing")]
		tracing::info!(login_path, "session expired; sign-in required");
		#[cfg(not(feature = "tracing"))]
		let _ = login_path;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_prelude::*;

	#[test]
	fn closures_act_as_navigators() {
		let visits = Arc::new(Mutex::new(Vec::new()));
		let sink = visits.clone();
		let navigator = move |path: &str| {
			sink.lock().push(path.to_owned());
		};

		navigator.redirect_to_login("/login");
		NullNavigator.redirect_to_login("/login");

		let recorded = visits.lock().clone();

		assert_eq!(recorded, vec!["/login".to_owned()]);
	}
}
