//! # Domain Traits
//!
//! Extension points of the routing core: pages (handlers), the per-user stage
//! and access-level store, and per-platform repliers.
//! Implementations live in the Infrastructure and Interface layers.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::domain::reply::{Replies, Reply};
use crate::domain::types::{MessageContent, Messenger, UserId};

/// A destination of a transition or payload.
///
/// Every page receives the platform user id, the platform tag and what the
/// user sent, and answers with zero or more replies.
#[async_trait]
pub trait Page: Send + Sync {
    /// Stable name, used for duplicate detection and logs.
    fn name(&self) -> &str;

    async fn call(
        &self,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
        message: MessageContent,
    ) -> Replies;
}

impl fmt::Debug for dyn Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({})", self.name())
    }
}

pub type Handler = Arc<dyn Page>;

/// Two handlers are the same page when their names match.
pub fn same_page(a: &Handler, b: &Handler) -> bool {
    a.name() == b.name()
}

struct FnPage<F> {
    name: String,
    func: F,
}

#[async_trait]
impl<F, Fut> Page for FnPage<F>
where
    F: Fn(UserId, Messenger, MessageContent) -> Fut + Send + Sync,
    Fut: Future<Output = Replies> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(
        &self,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
        message: MessageContent,
    ) -> Replies {
        (self.func)(user_messenger_id, user_messenger.clone(), message).await
    }
}

/// Wraps an async function or closure into a [`Handler`].
pub fn page_fn<F, Fut>(name: impl Into<String>, func: F) -> Handler
where
    F: Fn(UserId, Messenger, MessageContent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Replies> + Send + 'static,
{
    Arc::new(FnPage {
        name: name.into(),
        func,
    })
}

/// Per-user stage storage.
///
/// `stage` is responsible for provisioning a record for never-seen users.
#[async_trait]
pub trait StageStore: Send + Sync {
    async fn stage(&self, user_messenger_id: UserId, user_messenger: &Messenger) -> anyhow::Result<String>;

    async fn set_stage(
        &self,
        to_stage: &str,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
    ) -> anyhow::Result<()>;
}

/// Per-user access-level storage.
#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn access_level(
        &self,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
    ) -> anyhow::Result<String>;

    /// Stores a new access level. Read-only stores keep the default, which
    /// ignores the change.
    async fn set_access_level(
        &self,
        to_access_level: &str,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
    ) -> anyhow::Result<()> {
        tracing::warn!(
            "Access level change to '{}' for {}:{} ignored by read-only store",
            to_access_level,
            user_messenger,
            user_messenger_id
        );
        Ok(())
    }
}

/// Delivers replies to one platform.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply(&self, reply: &Reply) -> anyhow::Result<()>;
}
