//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits:
//!
//! - **employee_api**: reqwest-backed client for the upstream employee service
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic;
//! retries, admission, and fallbacks live in the domain resilience pipeline.

pub mod employee_api;
