//! Client configuration: where the API lives, where "log in again" points, and how the
//! refresh credential travels.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Deployment presets for the API base URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	/// Local development against `localhost`.
	#[default]
	Development,
	/// Container deployment where the API is reachable as `backend`.
	Production,
}
impl Environment {
	/// Returns the API base URL for this environment.
	pub const fn base_url(self) -> &'static str {
		match self {
			Environment::Development => "http://localhost:3000/api/v1/",
			Environment::Production => "http://backend:3000/api/v1/",
		}
	}

	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Environment::Development => "development",
			Environment::Production => "production",
		}
	}
}
impl FromStr for Environment {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"development" | "dev" => Ok(Environment::Development),
			"production" | "prod" => Ok(Environment::Production),
			_ => Err(ConfigError::InvalidEnv { name: ClientConfig::ENV_MODE, value: s.into() }),
		}
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How the refresh call proves the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshCredential {
	/// Send the stored refresh token as `Authorization: Bearer`.
	#[default]
	StoredBearer,
	/// Send nothing and rely on a cookie held by the transport.
	///
	/// Pair with `ReqwestHttpClient::with_cookie_store` so the cookie is dropped when the
	/// session ends.
	Cookie,
}

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// API root every request path is joined onto. Always ends with `/`.
	pub base_url: Url,
	/// Path the navigator is sent to when the session cannot be recovered.
	pub login_path: String,
	/// Refresh credential transport.
	pub refresh_credential: RefreshCredential,
}
impl ClientConfig {
	/// Environment variable selecting an [`Environment`] preset.
	pub const ENV_MODE: &'static str = "BEARER_SESSION_ENV";
	/// Environment variable overriding the base URL.
	pub const ENV_BASE_URL: &'static str = "BEARER_SESSION_BASE_URL";

	/// Creates a new builder seeded with development defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Builds a configuration for a deployment preset.
	pub fn for_environment(environment: Environment) -> Result<Self, ConfigError> {
		Self::builder().environment(environment).build()
	}

	/// Reads [`Self::ENV_MODE`] and [`Self::ENV_BASE_URL`]; unset variables fall back to
	/// development defaults.
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut builder = Self::builder();

		if let Ok(mode) = env::var(Self::ENV_MODE) {
			builder = builder.environment(mode.parse()?);
		}
		if let Ok(raw) = env::var(Self::ENV_BASE_URL) {
			let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
				url: raw.clone(),
				source: Some(source),
			})?;

			builder = builder.base_url(url);
		}

		builder.build()
	}

	/// Resolves `path` (relative, without a leading slash) against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base_url
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { path: path.into(), source })
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	/// Explicit base URL; overrides the environment preset.
	pub base_url: Option<Url>,
	/// Environment preset used when no base URL is set.
	pub environment: Environment,
	/// Login entry point.
	pub login_path: String,
	/// Refresh credential transport.
	pub refresh_credential: RefreshCredential,
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: None,
			environment: Environment::default(),
			login_path: "/login".into(),
			refresh_credential: RefreshCredential::default(),
		}
	}
}
impl ClientConfigBuilder {
	/// Sets an explicit base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Selects an environment preset.
	pub fn environment(mut self, environment: Environment) -> Self {
		self.environment = environment;

		self
	}

	/// Overrides the login entry point.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Selects the refresh credential transport.
	pub fn refresh_credential(mut self, credential: RefreshCredential) -> Self {
		self.refresh_credential = credential;

		self
	}

	/// Validates the inputs and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse(self.environment.base_url()).map_err(|source| {
				ConfigError::InvalidBaseUrl {
					url: self.environment.base_url().into(),
					source: Some(source),
				}
			})?,
		};

		if base_url.cannot_be_a_base() {
			return Err(ConfigError::InvalidBaseUrl { url: base_url.into(), source: None });
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}
		if !self.login_path.starts_with('/') {
			return Err(ConfigError::InvalidLoginPath(self.login_path));
		}

		Ok(ClientConfig {
			base_url,
			login_path: self.login_path,
			refresh_credential: self.refresh_credential,
		})
	}
}
