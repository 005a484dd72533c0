//! Cached HamQTH session handling.

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A session id together with the moment it stops being trusted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Session created at `created_at` that lives for `lifetime`
    pub fn new(token: impl Into<String>, created_at: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            token: token.into(),
            expires_at: created_at + lifetime,
        }
    }

    /// The session id sent with lookups
    pub fn token(&self) -> &str {
        &self.token
    }

    /// When the session is considered expired
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check if the session can still be used at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Where the cached session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Never logged in, or the last session was rejected
    NoSession,
    /// A session is cached and not yet expired
    Valid,
    /// A session is cached but past its lifetime
    Expired,
}

/// Owns the one live session and decides when to log in again.
///
/// The lock is held across the expiry check and the login, so concurrent
/// callers wait for a single login instead of racing to create their own.
#[derive(Debug)]
pub struct SessionManager {
    lifetime: Duration,
    current: Mutex<Option<Session>>,
}

impl SessionManager {
    /// Create an empty manager whose sessions live for `lifetime`
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            current: Mutex::new(None),
        }
    }

    /// Current state of the cache
    pub async fn state(&self) -> SessionState {
        match self.current.lock().await.as_ref() {
            None => SessionState::NoSession,
            Some(session) if session.is_valid_at(Utc::now()) => SessionState::Valid,
            Some(_) => SessionState::Expired,
        }
    }

    /// Return the cached session id, or run `login` to obtain and cache a new one.
    ///
    /// `login` is only invoked when there is no session or it has expired. A
    /// failed login leaves the cache untouched and its error is returned as is.
    pub async fn get_session_id<F, Fut>(&self, login: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut current = self.current.lock().await;

        if let Some(session) = current.as_ref() {
            if session.is_valid_at(Utc::now()) {
                debug!("Reusing cached HamQTH session");
                return Ok(session.token.clone());
            }
            debug!("Cached HamQTH session expired at {}", session.expires_at);
        }

        let token = login().await?;
        let session = Session::new(token, Utc::now(), self.lifetime);
        info!("HamQTH session valid until {}", session.expires_at);

        let token = session.token.clone();
        *current = Some(session);
        Ok(token)
    }

    /// Drop the cached session so the next request logs in again
    pub async fn invalidate(&self) {
        let mut current = self.current.lock().await;
        if current.take().is_some() {
            debug!("Dropped cached HamQTH session");
        }
    }

    /// Drop the cached session only if it is still the one holding `token`.
    ///
    /// A session another caller already refreshed is left alone.
    pub async fn invalidate_token(&self, token: &str) {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|s| s.token == token) {
            *current = None;
            debug!("Dropped rejected HamQTH session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HamQthError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn counted_login(counter: &AtomicUsize) -> Result<String> {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{}", n))
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session::new("abc", now, Duration::seconds(3600));
        assert_eq!(session.token(), "abc");
        assert!(session.is_valid_at(now));
        assert!(session.is_valid_at(now + Duration::seconds(3599)));
        assert!(!session.is_valid_at(now + Duration::seconds(3600)));
    }

    #[tokio::test]
    async fn test_session_is_reused_until_invalidated() {
        let manager = SessionManager::new(Duration::seconds(3600));
        let logins = AtomicUsize::new(0);
        assert_eq!(manager.state().await, SessionState::NoSession);

        let first = manager.get_session_id(|| counted_login(&logins)).await.unwrap();
        let second = manager.get_session_id(|| counted_login(&logins)).await.unwrap();
        assert_eq!(first, "token-1");
        assert_eq!(second, "token-1");
        assert_eq!(logins.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state().await, SessionState::Valid);

        manager.invalidate().await;
        assert_eq!(manager.state().await, SessionState::NoSession);

        let third = manager.get_session_id(|| counted_login(&logins)).await.unwrap();
        assert_eq!(third, "token-2");
        assert_eq!(logins.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_token_ignores_stale_token() {
        let manager = SessionManager::new(Duration::seconds(3600));
        let logins = AtomicUsize::new(0);

        manager.get_session_id(|| counted_login(&logins)).await.unwrap();
        manager.invalidate_token("token-0").await;
        assert_eq!(manager.state().await, SessionState::Valid);

        manager.invalidate_token("token-1").await;
        assert_eq!(manager.state().await, SessionState::NoSession);
    }

    #[tokio::test]
    async fn test_expired_session_forces_login() {
        let manager = SessionManager::new(Duration::zero());
        let logins = AtomicUsize::new(0);

        manager.get_session_id(|| counted_login(&logins)).await.unwrap();
        assert_eq!(manager.state().await, SessionState::Expired);

        let token = manager.get_session_id(|| counted_login(&logins)).await.unwrap();
        assert_eq!(token, "token-2");
        assert_eq!(logins.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_login_propagates() {
        let manager = SessionManager::new(Duration::seconds(3600));

        let result = manager
            .get_session_id(|| async { Err(HamQthError::login_failed("Wrong user name or password")) })
            .await;

        assert!(matches!(result, Err(HamQthError::LoginFailed { .. })));
        assert_eq!(manager.state().await, SessionState::NoSession);
    }
}
