//! Username/password authentication against the credential table.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::auth::context::Identity;
use crate::auth::credentials::CredentialStore;
use crate::auth::error::AuthError;
use crate::auth::password::{PasswordError, PasswordVerifier, digest_cost};

/// Turns a (username, password) pair into an [`Identity`].
pub struct Authenticator {
    credentials: Arc<CredentialStore>,
    verifier: PasswordVerifier,
    /// Digest checked for unknown usernames so they cost as much as known ones.
    decoy_hash: String,
}

impl Authenticator {
    /// Create an authenticator and hash one decoy password.
    ///
    /// The decoy uses the highest cost found among the provisioned digests, so
    /// an unknown username costs as much as the slowest real check. The
    /// verifier's cost applies only when no digest carries a readable cost.
    pub fn new(
        credentials: Arc<CredentialStore>,
        verifier: PasswordVerifier,
    ) -> Result<Self, PasswordError> {
        let decoy_cost = credentials
            .iter()
            .filter_map(|c| digest_cost(&c.password_hash))
            .max()
            .unwrap_or(verifier.cost());
        if decoy_cost != verifier.cost() {
            debug!(
                "Provisioned digests use bcrypt cost {}, configured cost is {}",
                decoy_cost,
                verifier.cost()
            );
        }

        let decoy_hash = PasswordVerifier::new(decoy_cost).hash("itemvault-decoy-password")?;
        Ok(Self {
            credentials,
            verifier,
            decoy_hash,
        })
    }

    /// Verify a username/password pair.
    ///
    /// Unknown user and wrong password both return `AuthenticationFailed`.
    /// This runs bcrypt on the calling thread; async callers should use
    /// [`Authenticator::authenticate_async`].
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let Some(credential) = self.credentials.get(username) else {
            // Burn the same bcrypt work as a real check.
            let _ = self.verifier.verify(password, &self.decoy_hash);
            warn!("Login rejected for {:?}", username);
            return Err(AuthError::AuthenticationFailed);
        };

        if !self.verifier.verify(password, &credential.password_hash) {
            warn!("Login rejected for {:?}", username);
            return Err(AuthError::AuthenticationFailed);
        }

        debug!("Credentials verified for {}", credential.username);
        Ok(Identity::new(
            credential.username.clone(),
            credential.role.clone(),
        ))
    }

    /// [`Authenticator::authenticate`] on the blocking pool.
    pub async fn authenticate_async(
        self: &Arc<Self>,
        username: String,
        password: String,
    ) -> Result<Identity, AuthError> {
        let this = Arc::clone(self);
        match tokio::task::spawn_blocking(move || this.authenticate(&username, &password)).await {
            Ok(result) => result,
            Err(e) => {
                error!("Password verification task failed: {}", e);
                Err(AuthError::AuthenticationFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::Credential;
    use crate::auth::password::MIN_BCRYPT_COST;
    use std::time::Instant;

    fn authenticator() -> Authenticator {
        let verifier = PasswordVerifier::new(MIN_BCRYPT_COST);
        let store = CredentialStore::new(vec![
            Credential::new("sajan", "admin", verifier.hash("secret").unwrap()),
            Credential::new("sajal", "user", verifier.hash("hunter2").unwrap()),
        ])
        .unwrap();
        Authenticator::new(Arc::new(store), verifier).unwrap()
    }

    #[test]
    fn test_correct_password_succeeds() {
        let auth = authenticator();
        let identity = auth.authenticate("sajan", "secret").unwrap();
        assert_eq!(identity.username().as_str(), "sajan");
        assert_eq!(identity.role().as_str(), "admin");

        let identity = auth.authenticate("sajal", "hunter2").unwrap();
        assert_eq!(identity.role().as_str(), "user");
    }

    #[test]
    fn test_wrong_password_fails() {
        let auth = authenticator();
        assert_eq!(
            auth.authenticate("sajan", "hunter2"),
            Err(AuthError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_unknown_user_is_indistinguishable() {
        let auth = authenticator();
        let unknown = auth.authenticate("mallory", "secret");
        let wrong = auth.authenticate("sajan", "nope");
        assert_eq!(unknown, wrong);
        assert_eq!(unknown, Err(AuthError::AuthenticationFailed));
    }

    #[test]
    fn test_decoy_password_does_not_log_in_unknown_user() {
        let auth = authenticator();
        assert_eq!(
            auth.authenticate("mallory", "itemvault-decoy-password"),
            Err(AuthError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_decoy_matches_highest_provisioned_cost() {
        let fast = PasswordVerifier::new(MIN_BCRYPT_COST);
        let store = CredentialStore::new(vec![
            Credential::new("sajan", "admin", PasswordVerifier::new(6).hash("secret").unwrap()),
            Credential::new("sajal", "user", fast.hash("hunter2").unwrap()),
        ])
        .unwrap();
        let auth = Authenticator::new(Arc::new(store), fast).unwrap();
        assert_eq!(digest_cost(&auth.decoy_hash), Some(6));
    }

    #[test]
    fn test_decoy_falls_back_to_configured_cost() {
        let store =
            CredentialStore::new(vec![Credential::new("sajan", "admin", "not-a-digest")]).unwrap();
        let auth = Authenticator::new(Arc::new(store), PasswordVerifier::new(5)).unwrap();
        assert_eq!(digest_cost(&auth.decoy_hash), Some(5));
    }

    #[test]
    fn test_unknown_user_costs_as_much_as_known_user() {
        let store = CredentialStore::new(vec![Credential::new(
            "sajan",
            "admin",
            PasswordVerifier::new(8).hash("secret").unwrap(),
        )])
        .unwrap();
        let auth = Authenticator::new(Arc::new(store), PasswordVerifier::new(MIN_BCRYPT_COST))
            .unwrap();

        let started = Instant::now();
        assert!(auth.authenticate("sajan", "wrong").is_err());
        let known = started.elapsed();

        let started = Instant::now();
        assert!(auth.authenticate("mallory", "wrong").is_err());
        let unknown = started.elapsed();

        assert!(
            known < unknown * 10,
            "known user took {:?}, unknown user took {:?}",
            known,
            unknown
        );
    }

    #[tokio::test]
    async fn test_authenticate_async() {
        let auth = Arc::new(authenticator());
        let identity = auth
            .authenticate_async("sajan".to_string(), "secret".to_string())
            .await
            .unwrap();
        assert_eq!(identity.username().as_str(), "sajan");

        let err = auth
            .authenticate_async("sajan".to_string(), "bad".to_string())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::AuthenticationFailed);
    }
}
