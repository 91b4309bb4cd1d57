//! Employee gateway library modules.
//!
//! A resilient pass-through in front of an unreliable upstream employee
//! service: rate-limited, retried, and fallback-protected reads, idempotent
//! creates, and aggregate queries over live snapshots.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
