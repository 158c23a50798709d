//! # Reply Division
//!
//! Sorts outbound replies by platform. Each registered messenger gets its own
//! replier and its own throttle; [`ReplyDivision::compile`] freezes the
//! registrations into a [`Dispatcher`].

use anyhow::anyhow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::throttle::Throttle;
use crate::domain::error::BuildError;
use crate::domain::reply::Reply;
use crate::domain::traits::Replier;
use crate::domain::types::Messenger;

struct Lane {
    replier: Arc<dyn Replier>,
    throttle: Throttle,
}

/// Messenger registrations under construction.
#[derive(Default)]
pub struct ReplyDivision {
    lanes: Vec<(Messenger, Arc<dyn Replier>, u32)>,
}

impl ReplyDivision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_messenger(
        &mut self,
        messenger: Messenger,
        replier: Arc<dyn Replier>,
        messages_per_second: u32,
    ) -> Result<(), BuildError> {
        if messages_per_second == 0 {
            return Err(BuildError::ZeroRate(messenger.to_string()));
        }
        for (existing, existing_replier, _) in &self.lanes {
            if *existing == messenger {
                return Err(BuildError::DuplicateMessenger(messenger.to_string()));
            }
            if Arc::ptr_eq(existing_replier, &replier) {
                return Err(BuildError::SharedReplier {
                    messenger: messenger.to_string(),
                    existing: existing.to_string(),
                });
            }
        }
        tracing::debug!(
            "Registered messenger '{}' at {} message(s) per second",
            messenger,
            messages_per_second
        );
        self.lanes.push((messenger, replier, messages_per_second));
        Ok(())
    }

    pub fn compile(self) -> Dispatcher {
        let lanes: HashMap<Messenger, Lane> = self
            .lanes
            .into_iter()
            .map(|(messenger, replier, rate)| {
                (
                    messenger,
                    Lane {
                        replier,
                        throttle: Throttle::new(rate),
                    },
                )
            })
            .collect();
        tracing::info!("Reply division ready for {} messenger(s)", lanes.len());
        Dispatcher { lanes }
    }
}

/// Delivers replies through the replier of their messenger.
pub struct Dispatcher {
    lanes: HashMap<Messenger, Lane>,
}

impl Dispatcher {
    pub fn messengers(&self) -> impl Iterator<Item = &Messenger> {
        self.lanes.keys()
    }

    pub async fn dispatch(&self, reply: &Reply) -> anyhow::Result<()> {
        let lane = self
            .lanes
            .get(&reply.user_messenger)
            .ok_or_else(|| anyhow!("no replier registered for '{}'", reply.user_messenger))?;
        lane.throttle.acquire().await;
        lane.replier.reply(reply).await
    }
}
