//! Login and credential lifecycle.

mod session;

pub use session::{Credentials, Session};
