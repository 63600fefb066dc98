//! Account calls under `auth/` plus local session helpers.

// self
use crate::{
	_prelude::*,
	api::ApiMessage,
	client::{SessionClient, expect_success},
	http::{ApiRequest, ApiTransport},
	obs::{self, CallKind},
	session::{AccessClaims, Role, SessionRecord, TokenSecret},
};

/// Registration payload.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
	/// Login name.
	pub login: String,
	/// Password.
	pub password: String,
	/// Password confirmation; the backend rejects mismatches.
	pub confirm_password: String,
	/// Requested role.
	pub role: Role,
}
impl RegisterRequest {
	/// Creates a payload for a regular user whose confirmation matches `password`.
	pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
		let password = password.into();

		Self {
			login: login.into(),
			confirm_password: password.clone(),
			password,
			role: Role::default(),
		}
	}

	/// Requests a different role.
	pub fn with_role(mut self, role: Role) -> Self {
		self.role = role;

		self
	}

	/// Overrides the confirmation field.
	pub fn with_confirmation(mut self, confirm_password: impl Into<String>) -> Self {
		self.confirm_password = confirm_password.into();

		self
	}
}
impl Debug for RegisterRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegisterRequest")
			.field("login", &self.login)
			.field("role", &self.role)
			.finish_non_exhaustive()
	}
}

/// Tokens returned by a successful login.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
	/// Access token.
	pub access_token: TokenSecret,
	/// Refresh token, absent when the backend keeps it in a cookie.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Role, when the backend reports it alongside the tokens.
	#[serde(default)]
	pub role: Option<Role>,
}

/// Identity of the signed-in account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Login name.
	pub login: String,
	/// Role.
	pub role: Role,
}

#[derive(Serialize)]
struct Credentials<'a> {
	login: &'a str,
	password: &'a str,
}

impl<T> SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates an account and remembers its login name.
	pub async fn register(&self, request: RegisterRequest) -> Result<ApiMessage> {
		const OPERATION: &str = "Registration";

		obs::observe(CallKind::Register, "register", async {
			let call = ApiRequest::post("auth/register").with_json(&request)?;
			let response = self.send_public(call).await?;
			let message = expect_success(&response, OPERATION)?.json(OPERATION)?;
			let mut record = self.store.fetch().await?.unwrap_or_default();

			record.login = Some(request.login.trim().to_owned());
			self.store.save(record).await?;

			Ok(message)
		})
		.await
	}

	/// Exchanges credentials for a token pair and persists the new session.
	///
	/// A role missing from the response is read from the access-token claims.
	pub async fn login(&self, login: &str, password: &str) -> Result<LoginResponse> {
		const OPERATION: &str = "Login";

		obs::observe(CallKind::Login, "login", async {
			let call = ApiRequest::post("auth/login").with_json(&Credentials { login, password })?;
			let response = self.send_public(call).await?;
			let grant: LoginResponse = expect_success(&response, OPERATION)?.json(OPERATION)?;
			let role = grant.role.or_else(|| {
				AccessClaims::peek(grant.access_token.expose()).ok().and_then(|claims| claims.role)
			});
			let record = SessionRecord {
				access_token: Some(grant.access_token.clone()),
				refresh_token: grant.refresh_token.clone(),
				role,
				..SessionRecord::for_login(login.trim())
			};

			self.store.save(record).await?;

			Ok(LoginResponse { role, ..grant })
		})
		.await
	}

	/// Refreshes the access token through the shared coordinator.
	///
	/// Joins an in-flight refresh instead of starting a second one.
	pub async fn refresh_session(&self) -> Result<TokenSecret> {
		obs::observe(CallKind::Refresh, "refresh_session", self.await_refresh()).await
	}

	/// Fetches the signed-in account.
	pub async fn user_info(&self) -> Result<UserInfo> {
		obs::observe(CallKind::UserInfo, "user_info", async {
			self.send_json("User info", ApiRequest::get("auth/user-info")).await
		})
		.await
	}

	/// Forgets the local session.
	///
	/// Clears the store, drops the token kept for late 401s, and empties transport-held
	/// credentials, so nothing issued to this session is replayed afterwards.
	pub async fn logout(&self) -> Result<()> {
		obs::observe(CallKind::Logout, "logout", async {
			self.store.clear().await?;
			self.coordinator.forget();
			self.transport.forget_credentials();

			Ok(())
		})
		.await
	}

	/// Returns `true` when an access token is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.store.fetch().await?.is_some_and(|record| record.is_authenticated()))
	}
}
