//! # Message Handler
//!
//! Entry point for one inbound message: looks up the user's stage and access
//! level, routes, and encodes every inline-button payload of the replies so it
//! fits the platform budget before leaving the core.

use std::sync::Arc;

use crate::application::transitions::{Router, UserContext};
use crate::domain::reply::{Keyboard, Replies};
use crate::domain::traits::{AccessStore, StageStore};
use crate::domain::types::{ANY, Message};

pub struct MessageHandler {
    router: Arc<Router>,
    stages: Arc<dyn StageStore>,
    access: Option<Arc<dyn AccessStore>>,
}

impl MessageHandler {
    pub fn new(router: Arc<Router>, stages: Arc<dyn StageStore>) -> Self {
        Self {
            router,
            stages,
            access: None,
        }
    }

    /// Enables access levels. Without a store every user has level `any`.
    pub fn with_access_store(mut self, access: Arc<dyn AccessStore>) -> Self {
        self.access = Some(access);
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub async fn get(&self, message: Message) -> anyhow::Result<Replies> {
        let Message {
            user_id,
            messenger,
            content,
        } = message;

        let stage = self.stages.stage(user_id, &messenger).await?;
        let access_level = match &self.access {
            Some(store) => store.access_level(user_id, &messenger).await?,
            None => ANY.to_string(),
        };

        let user = UserContext {
            user_messenger_id: user_id,
            user_messenger: &messenger,
            stage: &stage,
            access_level: &access_level,
        };
        let mut replies = self
            .router
            .run(
                content,
                &user,
                Some(self.stages.as_ref()),
                self.access.as_deref(),
            )
            .await?;

        if let Some(payloads) = self.router.payloads() {
            for reply in replies.iter_mut() {
                if let Some(Keyboard::Inline(buttons)) = &mut reply.keyboard {
                    for button in buttons.iter_mut() {
                        button.payload = payloads.shorten(&button.payload);
                    }
                }
            }
        }

        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::payloads::Payloads;
    use crate::application::route::Route;
    use crate::application::transitions::Transitions;
    use crate::domain::reply::{ButtonColor, InlineButtons, KeyboardLimits, Reply};
    use crate::domain::traits::page_fn;
    use crate::domain::types::{MessageContent, Messenger, PayloadBudget, UserId};
    use crate::payload;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Store {
        stage: Mutex<Option<String>>,
        lookups: Mutex<usize>,
    }

    #[async_trait]
    impl StageStore for Store {
        async fn stage(&self, _: UserId, _: &Messenger) -> anyhow::Result<String> {
            *self.lookups.lock().await += 1;
            Ok(self.stage.lock().await.clone().unwrap_or_else(|| "second".into()))
        }

        async fn set_stage(&self, to_stage: &str, _: UserId, _: &Messenger) -> anyhow::Result<()> {
            *self.stage.lock().await = Some(to_stage.to_string());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl StageStore for Failing {
        async fn stage(&self, _: UserId, _: &Messenger) -> anyhow::Result<String> {
            anyhow::bail!("database is down")
        }

        async fn set_stage(&self, _: &str, _: UserId, _: &Messenger) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn router() -> Arc<Router> {
        let second = page_fn("second", |id, messenger, _| async move {
            let mut buttons = InlineButtons::new(KeyboardLimits::default());
            buttons
                .add_button(
                    "Third",
                    ButtonColor::Positive,
                    payload! {
                        "type" => "default",
                        "action" => "go_to_third_page",
                        "data" => 1,
                        "plus" => 2,
                    },
                )
                .add_button("Broken", ButtonColor::Negative, payload! { "type" => "missing" });
            Replies::from(Reply::new(id, messenger, "second").with_keyboard(buttons.confirm().unwrap()))
        });
        let error = page_fn("error", |id, messenger, _| async move {
            Replies::from(Reply::new(id, messenger, "error"))
        });

        let mut payloads = Payloads::new(PayloadBudget::TELEGRAM);
        payloads.add_rules(&["go", "to", "third", "page"]).unwrap();
        payloads
            .add_payload(
                "type:default/action:go_to_third_page/data:/plus:",
                "second",
                error.clone(),
                Route::default(),
            )
            .unwrap();
        payloads.add_error_payload("type:error_input", error.clone()).unwrap();

        let mut transitions = Transitions::new();
        transitions
            .add_transition(Some("show"), "second", second, Route::default())
            .unwrap();
        transitions.add_error_return(error).unwrap();
        Arc::new(transitions.with_payloads(payloads.compile().unwrap()).compile().unwrap())
    }

    fn text(value: &str) -> Message {
        Message {
            user_id: 1,
            messenger: Messenger::from("tg"),
            content: MessageContent::Text(value.to_string()),
        }
    }

    #[tokio::test]
    async fn outbound_buttons_are_shortened() {
        let store = Arc::new(Store::default());
        let handler = MessageHandler::new(router(), store.clone());

        let replies = handler.get(text("show")).await.unwrap();
        let reply = replies.iter().next().unwrap();
        match &reply.keyboard {
            Some(Keyboard::Inline(buttons)) => {
                assert_eq!(
                    buttons[0].payload,
                    payload! { "t" => "d", "a" => "g_t_t_p", "d" => 1, "p" => 2 }
                );
                assert_eq!(buttons[1].payload, payload! { "t" => "e" });
            }
            other => panic!("unexpected keyboard: {other:?}"),
        }
        assert_eq!(*store.lookups.lock().await, 1);
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let handler = MessageHandler::new(router(), Arc::new(Failing));
        let err = handler.get(text("show")).await.unwrap_err();
        assert!(err.to_string().contains("database is down"));
    }
}
