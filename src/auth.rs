//! Auth-domain models: token secrets, cached credentials, and provider sessions.

pub mod session;
pub mod token;

pub use session::*;
pub use token::{credential::*, secret::*};
