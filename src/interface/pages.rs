//! # Demo Pages
//!
//! Page handlers of the bundled tour. Each returns the replies for one screen;
//! keyboards are built with the configured layout limits.

use async_trait::async_trait;

use crate::domain::reply::{
    ButtonColor, Buttons, InlineButtons, Keyboard, KeyboardError, KeyboardLimits, Replies, Reply,
};
use crate::domain::traits::Page;
use crate::domain::types::{MessageContent, Messenger, PayloadMap, UserId};
use crate::payload;
use crate::strings::logs;
use crate::strings::messages::{self, buttons};

fn reply(
    page: &str,
    id: UserId,
    messenger: Messenger,
    text: impl Into<String>,
    keyboard: Result<Keyboard, KeyboardError>,
) -> Reply {
    let reply = Reply::new(id, messenger, text);
    match keyboard {
        Ok(keyboard) => reply.with_keyboard(keyboard),
        Err(e) => {
            tracing::warn!("{}", logs::keyboard_dropped(page, &e.to_string()));
            reply
        }
    }
}

fn field(payload: &PayloadMap, key: &str) -> String {
    payload
        .get(key)
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

pub async fn first_page(
    limits: KeyboardLimits,
    id: UserId,
    messenger: Messenger,
    _message: MessageContent,
) -> Replies {
    let mut keyboard = Buttons::new(limits);
    keyboard.add_button(buttons::START, ButtonColor::Positive);
    reply("first", id, messenger, messages::FIRST, keyboard.confirm()).into()
}

pub async fn second_page(
    limits: KeyboardLimits,
    id: UserId,
    messenger: Messenger,
    _message: MessageContent,
) -> Replies {
    let mut keyboard = InlineButtons::new(limits);
    keyboard
        .add_button(
            buttons::GO_TO_NEXT,
            ButtonColor::Primary,
            payload! {
                "type" => "data",
                "action" => "go_to_third_page",
                "data" => "hello",
                "id" => id,
            },
        )
        .add_button(
            buttons::DELETED,
            ButtonColor::Negative,
            payload! { "type" => "fake", "id" => id },
        );
    reply("second", id, messenger, messages::SECOND, keyboard.confirm()).into()
}

pub async fn third_before_page(
    limits: KeyboardLimits,
    id: UserId,
    messenger: Messenger,
    message: MessageContent,
) -> Replies {
    let (data, user) = match &message {
        MessageContent::Payload(payload) => (field(payload, "data"), field(payload, "id")),
        _ => ("-".to_string(), "-".to_string()),
    };

    let mut tap = InlineButtons::new(limits);
    tap.add_button(
        buttons::TAP_IT,
        ButtonColor::Positive,
        payload! { "type" => "transition", "action" => "go_to_third_after_page" },
    );

    let mut navigation = Buttons::new(limits);
    navigation
        .add_button(buttons::GO_TO_PREVIOUS, ButtonColor::Secondary)
        .add_button(buttons::GO_TO_BEGINNING, ButtonColor::Negative);
    if let Err(e) = navigation.add_line() {
        tracing::warn!("{}", logs::keyboard_dropped("third", &e.to_string()));
    }
    navigation.add_button(buttons::GO_TO_NEXT, ButtonColor::Positive);

    let mut replies = Replies::new();
    replies
        .add_reply(reply(
            "third",
            id,
            messenger.clone(),
            messages::third_before(&data, &user),
            tap.confirm(),
        ))
        .add_reply(reply(
            "third",
            id,
            messenger,
            messages::THIRD_NAVIGATION,
            navigation.confirm(),
        ));
    replies
}

pub async fn third_after_page(
    limits: KeyboardLimits,
    id: UserId,
    messenger: Messenger,
    _message: MessageContent,
) -> Replies {
    let mut keyboard = InlineButtons::new(limits);
    keyboard.add_button(
        buttons::TO_FOURTH,
        ButtonColor::Primary,
        payload! { "type" => "transition", "action" => "go_to_fourth_page" },
    );
    reply("third_after", id, messenger, messages::THIRD_AFTER, keyboard.confirm()).into()
}

pub async fn fourth_page(
    limits: KeyboardLimits,
    id: UserId,
    messenger: Messenger,
    _message: MessageContent,
) -> Replies {
    let mut keyboard = Buttons::new(limits);
    keyboard
        .add_button(buttons::ADMIN, ButtonColor::Secondary)
        .add_button(buttons::NEXT, ButtonColor::Positive);
    if let Err(e) = keyboard.add_line() {
        tracing::warn!("{}", logs::keyboard_dropped("fourth", &e.to_string()));
    }
    keyboard.add_button(buttons::GO_BACK, ButtonColor::Negative);
    reply("fourth", id, messenger, messages::FOURTH, keyboard.confirm()).into()
}

pub async fn fourth_admin_page(
    limits: KeyboardLimits,
    id: UserId,
    messenger: Messenger,
    _message: MessageContent,
) -> Replies {
    let mut keyboard = Buttons::new(limits);
    keyboard
        .add_button(buttons::NEXT, ButtonColor::Positive)
        .add_button(buttons::GO_BACK, ButtonColor::Negative);
    reply("fourth_admin", id, messenger, messages::FOURTH_ADMIN, keyboard.confirm()).into()
}

pub async fn fifth_page(
    limits: KeyboardLimits,
    id: UserId,
    messenger: Messenger,
    _message: MessageContent,
) -> Replies {
    let mut keyboard = Buttons::new(limits);
    keyboard
        .add_button(buttons::GO_TO_BEGINNING, ButtonColor::Secondary)
        .add_button(buttons::USER, ButtonColor::Negative);
    reply("fifth", id, messenger, messages::FIFTH, keyboard.confirm()).into()
}

/// Default page of the last stage: accepts uploads.
pub async fn files_page(id: UserId, messenger: Messenger, message: MessageContent) -> Replies {
    let text = match &message {
        MessageContent::File { files, .. } => {
            let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
            messages::files_received(&names)
        }
        _ => messages::FIFTH_WAITING.to_string(),
    };
    Reply::new(id, messenger, text).into()
}

/// Where every unmatched input ends up.
#[derive(Debug, Default)]
pub struct ErrorPage;

#[async_trait]
impl Page for ErrorPage {
    fn name(&self) -> &str {
        "error"
    }

    async fn call(
        &self,
        user_messenger_id: UserId,
        user_messenger: &Messenger,
        message: MessageContent,
    ) -> Replies {
        tracing::debug!(
            "Error page for {}:{} after {:?}",
            user_messenger,
            user_messenger_id,
            message
        );
        Reply::new(user_messenger_id, user_messenger.clone(), messages::ERROR).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::FileAttachment;

    fn tg() -> Messenger {
        Messenger::from("tg")
    }

    #[tokio::test]
    async fn third_before_shows_payload_fields() {
        let message = MessageContent::Payload(payload! {
            "type" => "data",
            "action" => "go_to_third_page",
            "data" => "hello",
            "id" => 7,
        });
        let replies = third_before_page(KeyboardLimits::default(), 7, tg(), message).await;
        assert_eq!(replies.len(), 2);
        let first = replies.iter().next().unwrap();
        assert!(first.text.contains("Data: hello\nID: 7"));
        assert!(matches!(first.keyboard, Some(Keyboard::Inline(_))));
    }

    #[tokio::test]
    async fn keyboard_over_limits_is_dropped() {
        let limits = KeyboardLimits {
            max_buttons_in_row: 4,
            max_buttons_amount: 1,
            max_rows: 10,
        };
        let replies = fourth_page(limits, 1, tg(), MessageContent::Text("x".into())).await;
        let reply = replies.iter().next().unwrap();
        assert_eq!(reply.text, messages::FOURTH);
        assert!(reply.keyboard.is_none());
    }

    #[tokio::test]
    async fn files_page_lists_uploads() {
        let upload = MessageContent::File {
            caption: None,
            files: vec![FileAttachment {
                name: "cat.png".into(),
                mime_type: Some("image/png".into()),
                bytes: vec![0; 4],
            }],
        };
        let replies = files_page(1, tg(), upload).await;
        assert!(replies.iter().next().unwrap().text.starts_with("Got 1 file(s): cat.png"));

        let replies = files_page(1, tg(), MessageContent::Text("hi".into())).await;
        assert_eq!(replies.iter().next().unwrap().text, messages::FIFTH_WAITING);
    }

    #[tokio::test]
    async fn error_page_replies_to_sender() {
        let replies = ErrorPage.call(3, &tg(), MessageContent::Text("??".into())).await;
        let reply = replies.iter().next().unwrap();
        assert_eq!(reply.user_messenger_id, 3);
        assert_eq!(reply.text, messages::ERROR);
    }
}
