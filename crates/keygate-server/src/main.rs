//! KEYGATE Server — application entry point.
//!
//! Wires the credential store, signing authority, and auth service
//! together. The HTTP routing surface mounts on top of the
//! constructed [`AuthService`].

use keygate_auth::{AuthConfig, AuthService, SigningAuthority, TokenCodec};
use keygate_db::repository::{SurrealDelegationRepository, SurrealPrincipalRepository};
use keygate_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("keygate=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting KEYGATE server...");

    let db_config = DbConfig::from_env();
    let db = DbManager::connect(&db_config).await?;
    keygate_db::run_migrations(db.client()).await?;

    // One keypair for the process lifetime. Failure here is fatal:
    // the process must not serve traffic without a keypair. A restart
    // invalidates every previously issued token.
    let signer = SigningAuthority::generate()?;
    let codec = TokenCodec::new(signer);

    let principals = SurrealPrincipalRepository::new(db.client().clone());
    let delegations = SurrealDelegationRepository::new(db.client().clone());
    let _auth = AuthService::new(principals, delegations, codec, AuthConfig::default());

    let listen_on =
        std::env::var("KEYGATE_LISTEN_ON").unwrap_or_else(|_| "127.0.0.1:3000".into());
    tracing::info!(%listen_on, "KEYGATE core initialized");

    // TODO: mount the REST routes (sign-up/sign-in/validate/refresh,
    // service auth, delegated tokens) onto the auth service.

    Ok(())
}
