// Session authentication seam. Governance trusts whatever principal the
// frontend resolved; this module is the contract that resolution goes
// through, plus a token-registry reference implementation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::governance::GovernanceError;
use crate::models::PrincipalId;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("unknown or revoked session token")]
    UnknownToken,
    #[error("session token expired")]
    Expired,
}

impl From<AuthError> for GovernanceError {
    fn from(_: AuthError) -> Self {
        GovernanceError::Unauthenticated
    }
}

/// Resolves an opaque credential to a principal.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credential: &str) -> Result<PrincipalId, AuthError>;
}

#[derive(Debug, Clone)]
struct Session {
    principal: PrincipalId,
    expires_at: DateTime<Utc>,
}

/// In-memory token registry. Issues opaque session tokens with a fixed
/// lifetime and checks expiry at authentication time.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Issues a fresh token for `principal`.
    pub async fn issue(&self, principal: PrincipalId) -> String {
        let token = Uuid::new_v4().to_string();
        let session = Session {
            principal,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.write().await.insert(token.clone(), session);
        token
    }

    /// Drops a token. Returns whether it existed.
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

#[async_trait]
impl Authenticator for SessionRegistry {
    async fn authenticate(&self, credential: &str) -> Result<PrincipalId, AuthError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get(credential).ok_or(AuthError::UnknownToken)?;
        if session.expires_at <= Utc::now() {
            debug!("dropping expired session token");
            sessions.remove(credential);
            return Err(AuthError::Expired);
        }
        Ok(session.principal.clone())
    }
}
