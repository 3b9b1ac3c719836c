//! KEYGATE Auth — signing authority, signed-token codec, and the
//! authentication / issuance / refresh / delegation service.

pub mod config;
pub mod error;
pub mod service;
pub mod signer;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, DelegatedOutput, IssueOutput};
pub use signer::SigningAuthority;
pub use token::{Claims, PrincipalClaims, TokenCodec, TokenUse};
