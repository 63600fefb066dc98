//! Unverified access-token claim peeking.
//!
//! The backend issues HS256 JWTs whose payload carries the user id, the role code, and an
//! `exp` timestamp. The client cannot verify the signature and never needs to; it only reads
//! the payload to fill gaps in login responses (the role) and to report expiry. Nothing here
//! grants or denies access.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, session::Role};

/// Errors raised while peeking at a token payload.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClaimsError {
	/// Token does not have the `header.payload.signature` shape.
	#[error("Access token is not a JWT.")]
	Malformed,
	/// Payload segment is not valid base64url.
	#[error("Access token payload is not valid base64url.")]
	Encoding,
	/// Payload is not the expected JSON object.
	#[error("Access token payload is not valid JSON: {0}.")]
	Payload(String),
}

/// Claims the backend embeds in access tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AccessClaims {
	/// Numeric user identifier.
	#[serde(default)]
	pub id: Option<u64>,
	/// Role code.
	#[serde(default)]
	pub role: Option<Role>,
	/// Expiry as a Unix timestamp in seconds.
	#[serde(default)]
	pub exp: Option<i64>,
}
impl AccessClaims {
	/// Decodes the payload segment of `token` without verifying its signature.
	pub fn peek(token: &str) -> Result<Self, ClaimsError> {
		let mut segments = token.split('.');
		let (Some(_header), Some(payload), Some(_signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(ClaimsError::Malformed);
		};
		let bytes = URL_SAFE_NO_PAD
			.decode(payload.trim_end_matches('='))
			.map_err(|_| ClaimsError::Encoding)?;

		serde_json::from_slice(&bytes).map_err(|e| ClaimsError::Payload(e.to_string()))
	}

	/// Returns the expiry instant, if the token carries a representable one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.exp.and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
	}

	/// Returns `true` when the token carries an expiry at or before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|expires_at| expires_at <= instant)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn jwt(payload: &str) -> String {
		format!(
			"{}.{}.signature",
			URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
			URL_SAFE_NO_PAD.encode(payload)
		)
	}

	#[test]
	fn peek_reads_role_and_expiry() {
		let token = jwt(r#"{"authorized":true,"id":7,"role":2,"exp":1735689600}"#);
		let claims = AccessClaims::peek(&token).expect("Well-formed token should decode.");

		assert_eq!(claims.id, Some(7));
		assert_eq!(claims.role, Some(Role::Manager));
		assert_eq!(claims.expires_at(), Some(macros::datetime!(2025-01-01 00:00 UTC)));
		assert!(claims.is_expired_at(macros::datetime!(2025-01-01 00:00 UTC)));
		assert!(!claims.is_expired_at(macros::datetime!(2024-12-31 23:59 UTC)));
	}

	#[test]
	fn peek_rejects_opaque_tokens() {
		assert_eq!(AccessClaims::peek("opaque"), Err(ClaimsError::Malformed));
		assert_eq!(AccessClaims::peek("a.%%%.c"), Err(ClaimsError::Encoding));
		assert!(matches!(
			AccessClaims::peek(&jwt("not json")),
			Err(ClaimsError::Payload(_))
		));
	}
}
