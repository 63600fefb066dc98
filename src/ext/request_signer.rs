//! Request signing contracts that attach the stored session to outbound requests.

// std
use std::convert::Infallible;
// self
use crate::{http::OutboundRequest, session::SessionRecord};

/// Describes how to attach a [`SessionRecord`] to an outbound request without constraining
/// the HTTP client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and injects authorization state derived from `record`.
	fn attach_session(&self, request: Request, record: &SessionRecord) -> Result<Request, Error>;
}

/// Adds `Authorization: Bearer <access_token>` when the record holds an access token and
/// leaves the request untouched otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct BearerSigner;
impl RequestSignerExt<OutboundRequest, Infallible> for BearerSigner {
	fn attach_session(
		&self,
		mut request: OutboundRequest,
		record: &SessionRecord,
	) -> Result<OutboundRequest, Infallible> {
		if let Some(header) = record.authorization_header() {
			request.authorization = Some(header);
		}

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::RequestBuilder, Infallible> for BearerSigner {
	fn attach_session(
		&self,
		request: reqwest::RequestBuilder,
		record: &SessionRecord,
	) -> Result<reqwest::RequestBuilder, Infallible> {
		Ok(match record.authorization_header() {
			Some(header) => request.header(reqwest::header::AUTHORIZATION, header),
			None => request,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_prelude::*,
		http::{ApiBody, HttpMethod},
	};

	fn outbound() -> OutboundRequest {
		OutboundRequest {
			method: HttpMethod::Get,
			url: Url::parse("http://localhost:3000/api/v1/projects")
				.expect("Fixture URL should parse."),
			path: "projects".into(),
			authorization: None,
			body: ApiBody::Empty,
		}
	}

	#[test]
	fn signer_attaches_bearer_only_when_token_present() {
		let signed_record = SessionRecord::default().with_access_token("T1");
		let anonymous_record = SessionRecord::for_login("aquamarine");
		let Ok(signed) = BearerSigner.attach_session(outbound(), &signed_record);
		let Ok(unsigned) = BearerSigner.attach_session(outbound(), &anonymous_record);

		assert_eq!(signed.authorization.as_deref(), Some("Bearer T1"));
		assert_eq!(unsigned.authorization, None);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn signer_decorates_reqwest_builders() {
		let client = ReqwestClient::new();
		let record = SessionRecord::default().with_access_token("T1");
		let Ok(builder) = BearerSigner.attach_session(client.get("http://localhost/"), &record);
		let request = builder.build().expect("Signed request should build.");

		assert_eq!(
			request.headers().get(reqwest::header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
			Some("Bearer T1")
		);
	}
}
