//! Optional observability helpers for lifecycle operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_broker.op` with the `op` and
//!   `stage` (call site) fields, plus warn/debug events for degraded paths.
//! - Enable `metrics` to increment the `session_broker_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Lifecycle operations observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Session lookup through the single-flight fetcher.
	SessionFetch,
	/// Pre-request/post-response authorization hooks.
	Authorize,
	/// Refresh token exchange.
	Refresh,
	/// Forced sign-out escalation.
	SignOut,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::SessionFetch => "session_fetch",
			OpKind::Authorize => "authorize",
			OpKind::Refresh => "refresh",
			OpKind::SignOut => "sign_out",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
