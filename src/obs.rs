//! Optional observability helpers for broker flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `strava_route_broker.flow` with the `flow`
//!   and `stage` (call site) fields.
//! - Enable `metrics` to increment the `strava_route_broker_flow_total` counter for every
//!   attempt, success, or failure, labeled by `flow` and `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Broker operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Token resolution, including cache hits and static tokens.
	ResolveToken,
	/// Upstream `grant_type=refresh_token` exchange.
	RefreshToken,
	/// Route fetch and payload shaping.
	FetchRoute,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::ResolveToken => "resolve_token",
			FlowKind::RefreshToken => "refresh_token",
			FlowKind::FetchRoute => "fetch_route",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto its terminal outcome.
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(FlowKind::ResolveToken.to_string(), "resolve_token");
		assert_eq!(FlowKind::FetchRoute.as_str(), "fetch_route");
		assert_eq!(FlowOutcome::of::<(), ()>(&Ok(())), FlowOutcome::Success);
		assert_eq!(FlowOutcome::of::<(), ()>(&Err(())).to_string(), "failure");
	}
}
