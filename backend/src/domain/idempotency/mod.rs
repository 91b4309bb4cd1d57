//! Idempotency primitives for safe create retries.
//!
//! - [`IdempotencyKey`]: validated opaque token sent by clients via the
//!   `Idempotency-Key` HTTP header and forwarded upstream.
//! - [`IdempotencyCache`]: first-write-wins map from keys to the employee
//!   record produced for them, with optional TTL eviction.

mod cache;
mod key;

pub use cache::IdempotencyCache;
pub use key::{IdempotencyKey, IdempotencyKeyValidationError, MAX_IDEMPOTENCY_KEY_LEN};
