//! Persisted session state: the credential pair plus the signed-in identity.

// self
use crate::{
	_prelude::*,
	session::{AccessClaims, Role, TokenSecret},
};

/// Everything the client keeps between calls, mirroring browser local storage keys.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
	/// Short-lived token sent with every authorized request.
	pub access_token: Option<TokenSecret>,
	/// Longer-lived token used only to mint a new access token.
	pub refresh_token: Option<TokenSecret>,
	/// Login name of the signed-in account.
	pub login: Option<String>,
	/// Role of the signed-in account.
	pub role: Option<Role>,
}
impl SessionRecord {
	/// Creates an empty record for `login`.
	pub fn for_login(login: impl Into<String>) -> Self {
		Self { login: Some(login.into()), ..Default::default() }
	}

	/// Sets the access token.
	pub fn with_access_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.access_token = Some(token.into());

		self
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(token.into());

		self
	}

	/// Sets the role.
	pub fn with_role(mut self, role: Role) -> Self {
		self.role = Some(role);

		self
	}

	/// Returns `true` when an access token is present.
	pub fn is_authenticated(&self) -> bool {
		self.access_token.as_ref().is_some_and(|token| !token.is_blank())
	}

	/// Returns the `Authorization` header value, if an access token is present.
	pub fn authorization_header(&self) -> Option<String> {
		self.access_token.as_ref().filter(|token| !token.is_blank()).map(TokenSecret::bearer)
	}

	/// Peeks at the access token claims, if the token is a JWT.
	pub fn access_claims(&self) -> Option<AccessClaims> {
		self.access_token.as_ref().and_then(|token| AccessClaims::peek(token.expose()).ok())
	}

	/// Drops both tokens while keeping the identity fields.
	pub fn purge_credentials(&mut self) {
		self.access_token = None;
		self.refresh_token = None;
	}
}
impl Debug for SessionRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionRecord")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("login", &self.login)
			.field("role", &self.role)
			.finish()
	}
}
