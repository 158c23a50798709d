//! Side effects and gating shared by text transitions and payload definitions.

use crate::domain::traits::{AccessStore, StageStore};
use crate::domain::types::{AccessLevels, Messenger, UserId};

/// Where a matched edge moves the user, and who may take it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    /// Stage the user is moved to. `None` keeps the current stage.
    pub to_stage_id: Option<String>,
    pub access_level: AccessLevels,
    /// Access level granted after the edge is taken.
    pub to_access_level: Option<String>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage_id(mut self, stage: impl Into<String>) -> Self {
        self.to_stage_id = Some(stage.into());
        self
    }

    pub fn with_access(mut self, levels: impl Into<AccessLevels>) -> Self {
        self.access_level = levels.into();
        self
    }

    pub fn with_access_level(mut self, level: impl Into<String>) -> Self {
        self.to_access_level = Some(level.into());
        self
    }

    pub fn permits(&self, user_access_level: &str) -> bool {
        self.access_level.permits(user_access_level)
    }

    /// Writes the stage and access changes through the injected stores.
    /// Missing stores turn the matching change into a no-op.
    pub async fn apply(
        &self,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
        stages: Option<&dyn StageStore>,
        access: Option<&dyn AccessStore>,
    ) -> anyhow::Result<()> {
        if let (Some(stage), Some(store)) = (&self.to_stage_id, stages) {
            store.set_stage(stage, user_messenger_id, user_messenger).await?;
        }
        if let (Some(level), Some(store)) = (&self.to_access_level, access) {
            store
                .set_access_level(level, user_messenger_id, user_messenger)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_fields() {
        let route = Route::new()
            .with_stage_id("fourth")
            .with_access(["admin"])
            .with_access_level("user");
        assert_eq!(route.to_stage_id.as_deref(), Some("fourth"));
        assert!(route.permits("admin"));
        assert!(!route.permits("user"));
        assert_eq!(route.to_access_level.as_deref(), Some("user"));
    }

    #[test]
    fn default_route_admits_everyone() {
        let route = Route::default();
        assert!(route.permits("guest"));
        assert!(route.to_stage_id.is_none());
    }
}
