// self
use crate::{
	_prelude::*,
	config::RefreshCredential,
	obs::{CallKind, CallOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span around one API call or one refresh cycle.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Opens a `bearer_session.call` span tagged with the call kind and stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("bearer_session.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Opens a `bearer_session.refresh` span for the cycle this client leads.
	///
	/// `outcome` and `settled` stay empty until [`Self::record_settled`] fills them in.
	pub fn refresh_cycle(credential: RefreshCredential) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"bearer_session.refresh",
				credential = ?credential,
				outcome = tracing::field::Empty,
				settled = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = credential;

			Self {}
		}
	}

	/// Records how a refresh cycle ended and how many queued requests it settled.
	pub fn record_settled(&self, outcome: CallOutcome, settled: usize) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
			self.span.record("settled", settled as u64);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (outcome, settled);
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_output_through() {
		let span = CallSpan::new(CallKind::Projects, "instrument_passes_output_through");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[tokio::test]
	async fn refresh_cycle_records_after_instrumented_work() {
		let span = CallSpan::refresh_cycle(RefreshCredential::Cookie);
		let token = span.instrument(async { "T2" }).await;

		span.record_settled(CallOutcome::Success, 3);

		assert_eq!(token, "T2");
	}
}
