//! Authenticated request execution.

mod executor;

pub use executor::{DEFAULT_BASE_URL, Executor, Payload};
