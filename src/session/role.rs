//! Account roles as encoded by the backend (`1` user, `2` manager, `3` admin).

// self
use crate::_prelude::*;

/// Errors raised while decoding a [`Role`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RoleError {
	/// Numeric code outside the known range.
	#[error("Unknown role code {0}.")]
	UnknownCode(u64),
	/// String that is neither a code nor a role name.
	#[error("Unknown role `{0}`.")]
	UnknownName(String),
}

/// Account role attached to a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
	/// Regular user.
	#[default]
	User,
	/// Project manager.
	Manager,
	/// Administrator.
	Admin,
}
impl Role {
	/// Returns the wire code used by the backend.
	pub const fn code(self) -> u8 {
		match self {
			Role::User => 1,
			Role::Manager => 2,
			Role::Admin => 3,
		}
	}

	/// Returns a stable lowercase label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Role::User => "user",
			Role::Manager => "manager",
			Role::Admin => "admin",
		}
	}
}
impl TryFrom<u64> for Role {
	type Error = RoleError;

	fn try_from(code: u64) -> Result<Self, Self::Error> {
		match code {
			1 => Ok(Role::User),
			2 => Ok(Role::Manager),
			3 => Ok(Role::Admin),
			other => Err(RoleError::UnknownCode(other)),
		}
	}
}
impl FromStr for Role {
	type Err = RoleError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();

		if let Ok(code) = trimmed.parse::<u64>() {
			return Role::try_from(code);
		}

		match trimmed.to_ascii_lowercase().as_str() {
			"user" => Ok(Role::User),
			"manager" => Ok(Role::Manager),
			"admin" => Ok(Role::Admin),
			_ => Err(RoleError::UnknownName(trimmed.to_owned())),
		}
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl Serialize for Role {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_u8(self.code())
	}
}
impl<'de> Deserialize<'de> for Role {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		// Local storage round-trips the code as a string, the API sends a number.
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Code(u64),
			Text(String),
		}

		match Raw::deserialize(deserializer)? {
			Raw::Code(code) => Role::try_from(code).map_err(serde::de::Error::custom),
			Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn role_accepts_codes_and_names() {
		let numeric: Role = serde_json::from_str("2").expect("Numeric role should parse.");
		let stringified: Role =
			serde_json::from_str("\"3\"").expect("Stringified code should parse.");

		assert_eq!(numeric, Role::Manager);
		assert_eq!(stringified, Role::Admin);
		assert_eq!("User".parse::<Role>(), Ok(Role::User));
		assert_eq!(Role::try_from(9), Err(RoleError::UnknownCode(9)));
		assert!(serde_json::from_str::<Role>("\"root\"").is_err());
	}

	#[test]
	fn role_serializes_as_code() {
		assert_eq!(serde_json::to_string(&Role::Admin).expect("Role should serialize."), "3");
	}
}
