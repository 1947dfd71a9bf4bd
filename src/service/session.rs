use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionData {
    pub account_uid: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait SessionService: Send + Sync {
    async fn create(&self, account_uid: Uuid) -> Result<String, SessionError>;
    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, SessionError>;
    async fn delete(&self, session_id: &str) -> Result<(), SessionError>;
}

fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub struct RedisSessionService {
    conn: Arc<Mutex<MultiplexedConnection>>,
    ttl_seconds: u64,
    key_prefix: String,
}

impl RedisSessionService {
    pub async fn new(redis_url: &str, ttl_seconds: u64, key_prefix: String) -> Result<Self, SessionError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl_seconds,
            key_prefix,
        })
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}:session:{}", self.key_prefix, session_id)
    }
}

#[async_trait]
impl SessionService for RedisSessionService {
    async fn create(&self, account_uid: Uuid) -> Result<String, SessionError> {
        let session_id = new_session_id();
        let payload = SessionData {
            account_uid,
            created_at: Utc::now(),
        };
        let value = serde_json::to_string(&payload)?;

        let mut conn = self.conn.lock().await;
        let key = self.key(&session_id);
        conn.set_ex::<_, _, ()>(key, value, self.ttl_seconds).await?;
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, SessionError> {
        let mut conn = self.conn.lock().await;
        let key = self.key(session_id);
        let value: Option<String> = conn.get(key).await?;
        let Some(value) = value else {
            return Ok(None);
        };
        let session = serde_json::from_str(&value)?;
        Ok(Some(session))
    }

    async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        let mut conn = self.conn.lock().await;
        let key = self.key(session_id);
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

/// Process-local sessions for single-instance deployments without redis.
pub struct MemorySessionService {
    sessions: Mutex<HashMap<String, (SessionData, DateTime<Utc>)>>,
    ttl: Duration,
}

impl MemorySessionService {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: i64::try_from(ttl_seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }
}

#[async_trait]
impl SessionService for MemorySessionService {
    async fn create(&self, account_uid: Uuid) -> Result<String, SessionError> {
        let session_id = new_session_id();
        let now = Utc::now();
        let payload = SessionData {
            account_uid,
            created_at: now,
        };
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, (_, expires_at)| *expires_at > now);
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        sessions.insert(session_id.clone(), (payload, expires_at));
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let Some((data, expires_at)) = sessions.get(session_id) else {
            return Ok(None);
        };
        if *expires_at <= Utc::now() {
            sessions.remove(session_id);
            return Ok(None);
        }
        Ok(Some(data.clone()))
    }

    async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        self.sessions.lock().await.remove(session_id);
        Ok(())
    }
}
