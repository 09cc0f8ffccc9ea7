use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::AdminSession;
use crate::domain::errors::AccessError;
use crate::domain::ports::Clock;

// Issued on a successful passcode check.
#[derive(Clone, Debug)]
pub struct AdminLoginGrant {
    pub token: String,
    pub expires_at: u64,
}

// Passcode gate for the admin surface. Tokens are opaque, held in memory
// and expire after the configured TTL.
pub struct AdminAccessUseCase<K> {
    pub clock: K,
    pub sessions: Arc<Mutex<HashMap<String, AdminSession>>>,
    pub passcode: String,
    pub ttl_seconds: u64,
}

impl<K: Clock> AdminAccessUseCase<K> {
    pub async fn login(&self, passcode: &str) -> Result<AdminLoginGrant, AccessError> {
        if passcode.trim() != self.passcode {
            return Err(AccessError::InvalidPasscode);
        }

        let token = Uuid::new_v4().to_string();
        let expires_at = self.clock.now_epoch_millis() + self.ttl_seconds * 1000;
        let mut sessions = self.sessions.lock().await;
        sessions.insert(token.clone(), AdminSession { expires_at });
        Ok(AdminLoginGrant { token, expires_at })
    }

    pub async fn verify(&self, token: &str) -> Result<(), AccessError> {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get(token) else {
            return Err(AccessError::InvalidToken);
        };
        if session.expires_at <= self.clock.now_epoch_millis() {
            sessions.remove(token);
            return Err(AccessError::SessionExpired);
        }
        Ok(())
    }

    pub async fn logout(&self, token: &str) -> bool {
        self.sessions.lock().await.remove(token).is_some()
    }
}
