//! Short-lived repository credentials.
//!
//! The project service hands out repository-access tokens that expire after
//! a short while. A [`CredentialBroker`] keeps the current one in memory,
//! answers whether it can still be used, and installs a fresh one into the
//! working copy's `origin` remote.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::driver::GitDriver;
use super::error::{GitError, Result};
use super::parse::redact_url;

/// A credential stops being valid this many seconds before it expires.
pub const SAFETY_BUFFER_SECS: i64 = 5 * 60;

/// Lifetime assumed when the service does not send an expiry.
pub const DEFAULT_TTL_SECS: i64 = 60 * 60;

const ORIGIN: &str = "origin";

/// Builds `https://<token>@host/path` from a repository URL.
///
/// Any userinfo already present in `repository_url` is replaced.
pub fn authenticated_url(repository_url: &str, token: &str) -> Result<String> {
    let mut url = Url::parse(repository_url).map_err(|e| {
        GitError::Configuration(format!(
            "Invalid repository URL '{}': {}",
            redact_url(repository_url),
            e
        ))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(GitError::Configuration(format!(
            "Repository URL must use http or https, got '{}'",
            url.scheme()
        )));
    }

    url.set_password(None)
        .and_then(|_| url.set_username(token))
        .map_err(|_| {
            GitError::Configuration("Repository URL cannot carry credentials".to_string())
        })?;

    Ok(url.to_string())
}

/// A time-boxed authorization to push/pull one repository.
pub struct RepositoryCredential {
    token: SecretString,
    repository_url: String,
    auth_url: String,
    expires_at: DateTime<Utc>,
}

impl RepositoryCredential {
    /// Creates a credential, defaulting the expiry to one hour from now.
    pub fn new(
        token: SecretString,
        repository_url: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let repository_url = repository_url.into();
        let auth_url = authenticated_url(&repository_url, token.expose_secret())?;
        let expires_at =
            expires_at.unwrap_or_else(|| Utc::now() + Duration::seconds(DEFAULT_TTL_SECS));

        Ok(Self {
            token,
            repository_url,
            auth_url,
            expires_at,
        })
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    /// Repository URL with the token embedded. Never log this.
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Valid iff `now < expires_at - 5 minutes`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(SAFETY_BUFFER_SECS)
    }
}

impl fmt::Debug for RepositoryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryCredential")
            .field("token", &"[REDACTED]")
            .field("repository_url", &self.repository_url)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Owns the in-memory repository credential for one working copy.
#[derive(Debug, Default)]
pub struct CredentialBroker {
    credential: Option<RepositoryCredential>,
}

impl CredentialBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a credential is held and still outside the safety buffer.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.credential
            .as_ref()
            .is_some_and(|credential| credential.is_valid_at(now))
    }

    /// The held credential, if it is still valid.
    pub fn credential(&self) -> Option<&RepositoryCredential> {
        self.credential
            .as_ref()
            .filter(|credential| credential.is_valid_at(Utc::now()))
    }

    /// Forgets the held credential.
    pub fn clear(&mut self) {
        self.credential = None;
    }

    /// Installs a freshly issued token into the working copy.
    ///
    /// Rewrites `origin` to the authenticated URL, limits git's credential
    /// helper to an expiring in-memory cache, and reads `origin` back to
    /// verify the change before recording the credential.
    pub async fn apply<D: GitDriver + ?Sized>(
        &mut self,
        driver: &D,
        token: SecretString,
        repository_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let credential = RepositoryCredential::new(token, repository_url, expires_at)?;

        // Whatever happens below, the old credential no longer describes origin.
        self.clear();

        driver
            .set_remote_url(ORIGIN, credential.auth_url())
            .await
            .map_err(|e| match e {
                GitError::NotARepository(_) => e,
                other => GitError::Configuration(format!("Failed to update origin: {}", other)),
            })?;

        let ttl = (credential.expires_at() - Utc::now()).num_seconds().max(60);
        driver
            .set_config("credential.helper", &format!("cache --timeout={}", ttl))
            .await?;

        let actual = driver.remote_url(ORIGIN).await?;
        if actual.as_deref() != Some(credential.auth_url()) {
            return Err(GitError::Configuration(
                "origin remote does not match the authenticated URL after update".to_string(),
            ));
        }

        log::info!(
            "Configured repository credentials for {} (expires {})",
            redact_url(credential.repository_url()),
            credential.expires_at()
        );
        self.credential = Some(credential);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeDriver;

    fn credential_expiring_at(expires_at: DateTime<Utc>) -> RepositoryCredential {
        RepositoryCredential::new(
            SecretString::from("tok"),
            "https://git.example.com/org/proj-x",
            Some(expires_at),
        )
        .unwrap()
    }

    #[test]
    fn test_validity_boundary() {
        let expires_at = Utc::now() + Duration::hours(2);
        let credential = credential_expiring_at(expires_at);

        assert!(credential.is_valid_at(expires_at - Duration::seconds(301)));
        assert!(credential.is_valid_at(expires_at - Duration::milliseconds(300_001)));
        assert!(!credential.is_valid_at(expires_at - Duration::seconds(300)));
        assert!(!credential.is_valid_at(expires_at - Duration::seconds(299)));
        assert!(!credential.is_valid_at(expires_at));
    }

    #[test]
    fn test_default_expiry_is_one_hour() {
        let before = Utc::now();
        let credential = RepositoryCredential::new(
            SecretString::from("tok"),
            "https://git.example.com/org/proj-x",
            None,
        )
        .unwrap();

        let ttl = credential.expires_at() - before;
        assert!(ttl >= Duration::seconds(DEFAULT_TTL_SECS - 5));
        assert!(ttl <= Duration::seconds(DEFAULT_TTL_SECS + 5));
        assert!(credential.is_valid_at(Utc::now()));
    }

    #[test]
    fn test_empty_broker_is_invalid() {
        let broker = CredentialBroker::new();
        assert!(!broker.is_valid());
        assert!(broker.credential().is_none());
    }

    #[test]
    fn test_authenticated_url() {
        assert_eq!(
            authenticated_url("https://git.example.com/org/proj-x", "abc").unwrap(),
            "https://abc@git.example.com/org/proj-x"
        );
        assert_eq!(
            authenticated_url("https://old:pw@git.example.com/org/proj-x.git", "new").unwrap(),
            "https://new@git.example.com/org/proj-x.git"
        );
        assert!(matches!(
            authenticated_url("ssh://git@git.example.com/org/proj-x", "abc"),
            Err(GitError::Configuration(_))
        ));
        assert!(authenticated_url("not a url", "abc").is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = credential_expiring_at(Utc::now() + Duration::hours(1));
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("tok@"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_apply_configures_origin() {
        let driver = FakeDriver::repository();
        let mut broker = CredentialBroker::new();

        broker
            .apply(
                &driver,
                SecretString::from("tok"),
                "https://git.example.com/org/proj-x",
                Some(Utc::now() + Duration::hours(1)),
            )
            .await
            .unwrap();

        assert!(broker.is_valid());
        assert_eq!(
            driver.remote().as_deref(),
            Some("https://tok@git.example.com/org/proj-x")
        );
        let helper = driver.config_value("credential.helper").unwrap();
        assert!(helper.starts_with("cache --timeout="));
    }

    #[tokio::test]
    async fn test_apply_fails_when_readback_differs() {
        let driver = FakeDriver::repository();
        driver.pin_remote_readback("https://git.example.com/somewhere-else");
        let mut broker = CredentialBroker::new();

        let err = broker
            .apply(
                &driver,
                SecretString::from("tok"),
                "https://git.example.com/org/proj-x",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GitError::Configuration(_)));
        assert!(!broker.is_valid());
    }

    #[tokio::test]
    async fn test_apply_outside_working_copy_keeps_error_kind() {
        let driver = FakeDriver::plain();
        let mut broker = CredentialBroker::new();

        let err = broker
            .apply(
                &driver,
                SecretString::from("tok"),
                "https://git.example.com/org/proj-x",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GitError::NotARepository(_)));
        assert!(!broker.is_valid());
    }

    #[tokio::test]
    async fn test_expired_credential_is_treated_as_absent() {
        let driver = FakeDriver::repository();
        let mut broker = CredentialBroker::new();

        broker
            .apply(
                &driver,
                SecretString::from("tok"),
                "https://git.example.com/org/proj-x",
                Some(Utc::now() + Duration::seconds(120)),
            )
            .await
            .unwrap();

        assert!(!broker.is_valid());
        assert!(broker.credential().is_none());
    }
}
