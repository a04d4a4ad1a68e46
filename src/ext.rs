//! Transport-agnostic seams for the request authorizer.
//!
//! [`BearerTarget`] lets the pre-request hook inspect and decorate any request type, and
//! [`ResponseStatus`] lets the post-response hook read the status of any response (or error)
//! without the broker owning an HTTP client for API traffic.

pub mod request_signer;
pub mod response_status;

pub use request_signer::*;
pub use response_status::*;
