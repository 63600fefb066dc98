//! Session-domain models: redacted secrets, roles, access-token claims, and persisted records.

pub mod claims;
pub mod record;
pub mod role;
pub mod secret;

pub use claims::*;
pub use record::*;
pub use role::*;
pub use secret::*;
