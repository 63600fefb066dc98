//! Public extension contracts (login navigation, request signing).
//!
//! Both hooks are traits so applications decide what "send the user to the login page" and
//! "attach the session to a request" mean for their own UI and HTTP stack.

pub mod navigator;
pub mod request_signer;

pub use navigator::*;
pub use request_signer::*;
