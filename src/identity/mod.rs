//! Identity and session-token handling for bloglist.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod token;
mod provider;

pub use principal::Principal;
pub use token::{Claims, TokenSigner};
pub use provider::{Authenticator, LoginRequest, LoginResponse};
