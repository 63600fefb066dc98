// self
use crate::obs::{CallKind, CallOutcome};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_session_call_total",
			"call" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a settled refresh cycle and how many queued requests it settled.
///
/// `bearer_session_refresh_total` counts cycles by outcome; the
/// `bearer_session_refresh_settled` histogram shows how many 401s each cycle absorbed.
pub fn record_refresh_cycle(outcome: CallOutcome, settled: usize) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("bearer_session_refresh_total", "outcome" => outcome.as_str())
			.increment(1);
		metrics::histogram!("bearer_session_refresh_settled", "outcome" => outcome.as_str())
			.record(settled as f64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (outcome, settled);
	}
}
