//! # In-Memory User Store
//!
//! Keeps each user's stage and access level in process memory. Records are
//! created on first lookup with the configured start stage.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::traits::{AccessStore, StageStore};
use crate::domain::types::{Messenger, UserId};

pub const DEFAULT_ACCESS_LEVEL: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub stage: String,
    pub access_level: String,
}

#[derive(Debug)]
pub struct MemoryUserStore {
    start_stage: String,
    users: Mutex<HashMap<(Messenger, UserId), UserRecord>>,
}

impl MemoryUserStore {
    pub fn new(start_stage: impl Into<String>) -> Self {
        Self {
            start_stage: start_stage.into(),
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `f` on the user's record, creating it first if needed.
    async fn with_record<T>(
        &self,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
        f: impl FnOnce(&mut UserRecord) -> T,
    ) -> T {
        let mut users = self.users.lock().await;
        let record = users
            .entry((user_messenger.clone(), user_messenger_id))
            .or_insert_with(|| {
                tracing::info!(
                    "New user {}:{} starts at '{}'",
                    user_messenger,
                    user_messenger_id,
                    self.start_stage
                );
                UserRecord {
                    stage: self.start_stage.clone(),
                    access_level: DEFAULT_ACCESS_LEVEL.to_string(),
                }
            });
        f(record)
    }

    pub async fn record(&self, user_messenger_id: UserId, user_messenger: &Messenger) -> Option<UserRecord> {
        self.users
            .lock()
            .await
            .get(&(user_messenger.clone(), user_messenger_id))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }
}

#[async_trait]
impl StageStore for MemoryUserStore {
    async fn stage(&self, user_messenger_id: UserId, user_messenger: &Messenger) -> anyhow::Result<String> {
        Ok(self
            .with_record(user_messenger_id, user_messenger, |r| r.stage.clone())
            .await)
    }

    async fn set_stage(
        &self,
        to_stage: &str,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
    ) -> anyhow::Result<()> {
        self.with_record(user_messenger_id, user_messenger, |r| {
            r.stage = to_stage.to_string();
        })
        .await;
        tracing::debug!("{}:{} moved to '{}'", user_messenger, user_messenger_id, to_stage);
        Ok(())
    }
}

#[async_trait]
impl AccessStore for MemoryUserStore {
    async fn access_level(
        &self,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
    ) -> anyhow::Result<String> {
        Ok(self
            .with_record(user_messenger_id, user_messenger, |r| r.access_level.clone())
            .await)
    }

    async fn set_access_level(
        &self,
        to_access_level: &str,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
    ) -> anyhow::Result<()> {
        self.with_record(user_messenger_id, user_messenger, |r| {
            r.access_level = to_access_level.to_string();
        })
        .await;
        tracing::info!(
            "{}:{} now has access level '{}'",
            user_messenger,
            user_messenger_id,
            to_access_level
        );
        Ok(())
    }
}
