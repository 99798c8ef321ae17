// self
use crate::obs::{AuthFlow, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(flow: AuthFlow, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"dagshub_auth_flow_total",
			"flow" => flow.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (flow, outcome);
	}
}

/// Records the success or failure of a finished flow.
pub fn record_flow_result<T, E>(flow: AuthFlow, result: &Result<T, E>) {
	match result {
		Ok(_) => record_flow_outcome(flow, FlowOutcome::Success),
		Err(_) => record_flow_outcome(flow, FlowOutcome::Failure),
	}
}
