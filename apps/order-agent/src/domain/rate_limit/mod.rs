//! Rate Limit Bounded Context
//!
//! Per-endpoint throttle tiers and the persisted session document that the
//! request governor reads and rewrites.

mod intensity;
mod session_info;

pub use intensity::Intensity;
pub use session_info::{EndpointCallRecord, SessionInfo, default_calls, normalize_path};
