//! Token secrets and the credential shapes built from them.

pub mod credential;
pub mod secret;
