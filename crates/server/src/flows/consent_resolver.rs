//! Turns a user and a client into the claims embedded in issued tokens.

use std::sync::Arc;

use crate::challenge::{ConsentSession, SessionClaims};
use crate::error::UserStoreError;
use crate::identity::{ApplicationGrant, UserDirectory};

/// Scopes and audiences to grant plus the session claims to attach.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConsent {
    pub grant_scope: Vec<String>,
    pub grant_access_token_audience: Vec<String>,
    pub session: ConsentSession,
}

/// Roles granted for `client_id`: every grant whose application name matches
/// exactly, concatenated in stored order. Duplicates are kept.
pub fn roles_for_client(grants: &[ApplicationGrant], client_id: &str) -> Vec<String> {
    grants
        .iter()
        .filter(|grant| grant.application == client_id)
        .flat_map(|grant| grant.roles.iter().cloned())
        .collect()
}

#[derive(Clone)]
pub struct ConsentResolver {
    users: Arc<dyn UserDirectory>,
}

impl ConsentResolver {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Resolve the claims for `identifier` (username or email) acting through `client_id`.
    ///
    /// Scopes and audiences pass through unchanged; no policy narrows them here.
    #[tracing::instrument(skip(self, scopes, audiences))]
    pub async fn resolve(
        &self,
        identifier: &str,
        client_id: &str,
        scopes: &[String],
        audiences: &[String],
    ) -> Result<ResolvedConsent, UserStoreError> {
        let user = self.users.find_by_identifier(identifier).await?;
        let roles = roles_for_client(&user.applications, client_id);
        tracing::debug!(roles = ?roles, "Resolved client roles");

        let claims = SessionClaims {
            email: user.email,
            username: user.user_name,
            last_name: user.last_name,
            roles,
        };

        Ok(ResolvedConsent {
            grant_scope: scopes.to_vec(),
            grant_access_token_audience: audiences.to_vec(),
            session: ConsentSession::symmetric(claims),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{MockUserDirectory, UserRecord};

    fn grant(application: &str, roles: &[&str]) -> ApplicationGrant {
        ApplicationGrant {
            application: application.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn toky() -> UserRecord {
        UserRecord {
            id: "u-1".into(),
            user_name: "toky".into(),
            email: "toky@example.com".into(),
            name: "Toky".into(),
            last_name: "Tokyo".into(),
            applications: vec![
                grant("A", &["r1"]),
                grant("B", &["r2"]),
                grant("A", &["r3", "r1"]),
            ],
        }
    }

    #[test]
    fn roles_are_filtered_by_exact_client_id() {
        let grants = vec![grant("A", &["r1"]), grant("B", &["r2"])];
        assert_eq!(roles_for_client(&grants, "A"), vec!["r1".to_string()]);
        assert!(roles_for_client(&grants, "C").is_empty());
        assert!(roles_for_client(&grants, "a").is_empty());
    }

    #[test]
    fn roles_keep_source_order_and_duplicates() {
        let roles = roles_for_client(&toky().applications, "A");
        assert_eq!(roles, vec!["r1", "r3", "r1"]);
    }

    #[tokio::test]
    async fn resolve_builds_symmetric_claims_and_passes_grants_through() {
        let mut users = MockUserDirectory::new();
        users
            .expect_find_by_identifier()
            .withf(|identifier| identifier == "toky")
            .times(1)
            .returning(|_| Ok(toky()));
        let resolver = ConsentResolver::new(Arc::new(users));

        let scopes = vec!["openid".to_string(), "offline".to_string()];
        let audiences = vec!["api".to_string()];
        let resolved = resolver
            .resolve("toky", "B", &scopes, &audiences)
            .await
            .expect("resolve");

        assert_eq!(resolved.grant_scope, scopes);
        assert_eq!(resolved.grant_access_token_audience, audiences);
        assert_eq!(resolved.session.access_token, resolved.session.id_token);
        assert_eq!(resolved.session.id_token.roles, vec!["r2"]);
        assert_eq!(resolved.session.id_token.email, "toky@example.com");
        assert_eq!(resolved.session.id_token.username, "toky");
        assert_eq!(resolved.session.id_token.last_name, "Tokyo");
    }

    #[tokio::test]
    async fn resolve_is_idempotent() {
        let mut users = MockUserDirectory::new();
        users.expect_find_by_identifier().returning(|_| Ok(toky()));
        let resolver = ConsentResolver::new(Arc::new(users));

        let scopes = vec!["openid".to_string()];
        let first = resolver.resolve("toky", "A", &scopes, &[]).await.unwrap();
        let second = resolver.resolve("toky", "A", &scopes, &[]).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn resolve_surfaces_missing_user() {
        let mut users = MockUserDirectory::new();
        users
            .expect_find_by_identifier()
            .returning(|identifier| Err(UserStoreError::NotFound(identifier.to_string())));
        let resolver = ConsentResolver::new(Arc::new(users));

        let err = resolver.resolve("ghost", "A", &[], &[]).await.unwrap_err();
        assert!(matches!(err, UserStoreError::NotFound(ref who) if who == "ghost"));
    }
}
