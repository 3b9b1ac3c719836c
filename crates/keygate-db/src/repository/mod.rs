//! SurrealDB repository implementations.

mod delegation;
mod principal;
mod sequence;

pub use delegation::SurrealDelegationRepository;
pub use principal::SurrealPrincipalRepository;
