//! Authentication service — credential verification, token issuance
//! and rotation, and delegated access.

use chrono::Duration;
use keygate_core::error::KeygateError;
use keygate_core::models::principal::{CreatePrincipal, Principal, PrincipalKind};
use keygate_core::repository::{DelegationRepository, PrincipalRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::{PrincipalClaims, TokenCodec, TokenUse};

/// A freshly issued access/refresh token pair.
#[derive(Debug)]
pub struct IssueOutput {
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token, now the principal's sole stored one.
    pub refresh_token: String,
    pub principal_id: u64,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// A delegated, access-scoped token minted for a user on behalf of a
/// service.
#[derive(Debug)]
pub struct DelegatedOutput {
    pub access_token: String,
    pub user_id: u64,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct AuthService<P: PrincipalRepository, D: DelegationRepository> {
    principals: P,
    delegations: D,
    codec: TokenCodec,
    config: AuthConfig,
}

impl<P: PrincipalRepository, D: DelegationRepository> AuthService<P, D> {
    pub fn new(principals: P, delegations: D, codec: TokenCodec, config: AuthConfig) -> Self {
        Self {
            principals,
            delegations,
            codec,
            config,
        }
    }

    /// Create a principal and issue its first token pair.
    ///
    /// Names are unique per kind; a duplicate surfaces as
    /// `Store(AlreadyExists)`.
    pub async fn register(
        &self,
        name: &str,
        secret: &str,
        kind: PrincipalKind,
    ) -> Result<IssueOutput, AuthError> {
        let principal = self
            .principals
            .create(CreatePrincipal {
                kind,
                name: name.to_string(),
                secret: secret.to_string(),
            })
            .await?;

        self.issue_pair(&principal).await
    }

    /// Verify credentials and issue a fresh token pair.
    pub async fn sign_in(
        &self,
        name: &str,
        secret: &str,
        kind: PrincipalKind,
    ) -> Result<IssueOutput, AuthError> {
        let principal = self.authenticate(name, secret, kind).await?;
        self.issue_pair(&principal).await
    }

    /// Look up a principal by name and compare the supplied secret.
    ///
    /// A missing name and a mismatched secret are indistinguishable to
    /// the caller; only store transport failures are reported apart.
    async fn authenticate(
        &self,
        name: &str,
        secret: &str,
        kind: PrincipalKind,
    ) -> Result<Principal, AuthError> {
        let principal = match self.principals.get_by_name(kind, name).await {
            Ok(p) => p,
            Err(KeygateError::NotFound { .. }) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(AuthError::Store(e)),
        };

        // Secrets are stored and compared verbatim.
        if principal.secret != secret {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(principal)
    }

    /// Mint an access/refresh pair and persist the refresh token as
    /// the principal's sole stored one.
    ///
    /// The persistence write is the single authoritative update per
    /// principal; if it fails, the operation as a whole fails and no
    /// tokens are considered issued.
    async fn issue_pair(&self, principal: &Principal) -> Result<IssueOutput, AuthError> {
        let claims = principal_claims(principal);

        let access_token =
            self.codec
                .encode(claims.clone(), TokenUse::Access, self.access_ttl())?;
        let refresh_token = self
            .codec
            .encode(claims, TokenUse::Refresh, self.refresh_ttl())?;

        self.principals
            .set_refresh_token(principal.kind, principal.id, &refresh_token)
            .await?;

        Ok(IssueOutput {
            access_token,
            refresh_token,
            principal_id: principal.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Verify an access token and return the embedded identity.
    ///
    /// Purely stateless — no store lookup is performed.
    pub fn validate(&self, access_token: &str) -> Result<PrincipalClaims, AuthError> {
        let claims = self.codec.decode(access_token)?;
        if claims.token_use != TokenUse::Access {
            return Err(AuthError::TokenMalformed("expected an access token".into()));
        }
        Ok(claims.principal)
    }

    /// Rotate a refresh token: verify it cryptographically, then
    /// against the principal's stored token, and issue a new pair.
    ///
    /// A token that decodes fine but no longer matches the stored one
    /// was already rotated away and is rejected as stale. Rotation
    /// happens on every refresh, so no refresh token is usable twice.
    pub async fn refresh(
        &self,
        presented: &str,
        kind: PrincipalKind,
    ) -> Result<IssueOutput, AuthError> {
        let claims = self.codec.decode(presented)?;
        if claims.token_use != TokenUse::Refresh {
            return Err(AuthError::TokenMalformed("expected a refresh token".into()));
        }
        if !kind_matches(&claims.principal, kind) {
            return Err(AuthError::TokenMalformed("principal kind mismatch".into()));
        }

        let principal = match self.principals.get_by_id(kind, claims.principal.id()).await {
            Ok(p) => p,
            Err(KeygateError::NotFound { .. }) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(AuthError::Store(e)),
        };

        // Cheap early rejection; harmless to race past, the
        // conditional write below is authoritative.
        if principal.refresh_token.as_deref() != Some(presented) {
            return Err(AuthError::TokenStale);
        }

        let claims = principal_claims(&principal);
        let access_token =
            self.codec
                .encode(claims.clone(), TokenUse::Access, self.access_ttl())?;
        let refresh_token = self
            .codec
            .encode(claims, TokenUse::Refresh, self.refresh_ttl())?;

        // Overwrite conditioned on the presented token still being the
        // stored one. Of two concurrent refreshes with the same token,
        // the loser's write matches nothing and surfaces as stale.
        match self
            .principals
            .rotate_refresh_token(kind, principal.id, presented, &refresh_token)
            .await
        {
            Ok(()) => {}
            Err(KeygateError::NotFound { .. }) => return Err(AuthError::TokenStale),
            Err(e) => return Err(AuthError::Store(e)),
        }

        Ok(IssueOutput {
            access_token,
            refresh_token,
            principal_id: principal.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Let an authenticated service obtain an access-scoped token for
    /// a user it has a registered relation with.
    ///
    /// The minted token does not go through refresh-token persistence:
    /// it is a narrow-purpose, short-lived delegated credential, not a
    /// new session for the user.
    pub async fn delegated_access(
        &self,
        service_token: &str,
        user_id: u64,
        service_username: &str,
    ) -> Result<DelegatedOutput, AuthError> {
        let claims = self.codec.decode(service_token)?;
        if claims.token_use != TokenUse::Access {
            return Err(AuthError::TokenMalformed("expected an access token".into()));
        }
        let service_id = match claims.principal {
            PrincipalClaims::Service { id, .. } => id,
            PrincipalClaims::User { .. } => return Err(AuthError::DelegationDenied),
        };

        // The exact (service, user, service_username) triple must be
        // registered; anything less fails closed.
        match self
            .delegations
            .find(service_id, user_id, service_username)
            .await
        {
            Ok(_) => {}
            Err(KeygateError::NotFound { .. }) => return Err(AuthError::DelegationDenied),
            Err(e) => return Err(AuthError::Store(e)),
        }

        let user = self
            .principals
            .get_by_id(PrincipalKind::User, user_id)
            .await?;

        let access_token =
            self.codec
                .encode(principal_claims(&user), TokenUse::Access, self.access_ttl())?;

        Ok(DelegatedOutput {
            access_token,
            user_id: user.id,
        })
    }

    fn access_ttl(&self) -> Duration {
        Duration::seconds(self.config.access_token_lifetime_secs as i64)
    }

    fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.config.refresh_token_lifetime_secs as i64)
    }
}

fn principal_claims(principal: &Principal) -> PrincipalClaims {
    match principal.kind {
        PrincipalKind::User => PrincipalClaims::User {
            id: principal.id,
            name: principal.name.clone(),
        },
        PrincipalKind::Service => PrincipalClaims::Service {
            id: principal.id,
            name: principal.name.clone(),
        },
    }
}

fn kind_matches(claims: &PrincipalClaims, kind: PrincipalKind) -> bool {
    matches!(
        (claims, kind),
        (PrincipalClaims::User { .. }, PrincipalKind::User)
            | (PrincipalClaims::Service { .. }, PrincipalKind::Service)
    )
}
