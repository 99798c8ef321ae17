// self
use crate::{_prelude::*, obs::AuthFlow};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span covering one credential flow against one host.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span tagged with the flow, the call site, and the host the flow runs for.
	pub fn new(flow: AuthFlow, stage: &'static str, host: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("dagshub_auth.flow", flow = flow.as_str(), stage, host);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (flow, stage, host);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

/// Emits a debug event inside the current span (when tracing is enabled).
pub fn note(message: &'static str, host: &str, count: usize) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(host, count, "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (message, host, count);
	}
}

/// Emits a warning for a housekeeping step that failed without failing the flow.
///
/// `error` must not carry secret material; cache and acquisition errors never do.
pub fn warn(message: &'static str, host: &str, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(host, error = %error, "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (message, host, error);
	}
}
