//! # Console Replier
//!
//! A [`Replier`] for local runs: renders each reply as plain text, keyboard
//! rows included, and writes it to the log. Inline buttons show the callback
//! data they would carry.

use async_trait::async_trait;
use chrono::Local;

use crate::domain::reply::{Keyboard, Reply};
use crate::domain::traits::Replier;
use crate::domain::types::to_callback_data;

#[derive(Debug, Default)]
pub struct ConsoleReplier;

impl ConsoleReplier {
    pub fn new() -> Self {
        Self
    }

    pub fn render(reply: &Reply) -> String {
        let mut out = format!(
            "[{}] -> {}:{}\n{}",
            Local::now().format("%H:%M:%S"),
            reply.user_messenger,
            reply.user_messenger_id,
            reply.text
        );

        if let Some(keyboard) = &reply.keyboard {
            for row in keyboard.rows() {
                let row: Vec<String> = row
                    .iter()
                    .map(|(label, color)| format!("{} {}", color.emoji(), label))
                    .collect();
                out.push_str("\n  ");
                out.push_str(&row.join(" | "));
            }
            if let Keyboard::Inline(buttons) = keyboard {
                for button in buttons {
                    out.push_str(&format!(
                        "\n  {} => {}",
                        button.label,
                        to_callback_data(&button.payload)
                    ));
                }
            }
        }
        out
    }
}

#[async_trait]
impl Replier for ConsoleReplier {
    async fn reply(&self, reply: &Reply) -> anyhow::Result<()> {
        tracing::info!("{}", Self::render(reply));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reply::{ButtonColor, Buttons, InlineButtons, KeyboardLimits};
    use crate::domain::types::Messenger;
    use crate::payload;

    #[test]
    fn renders_plain_keyboard_rows() {
        let mut buttons = Buttons::new(KeyboardLimits::default());
        buttons
            .add_button("Yes", ButtonColor::Positive)
            .add_button("No", ButtonColor::Negative);
        buttons.add_line().unwrap();
        buttons.add_button("Back", ButtonColor::Secondary);

        let reply = Reply::new(5, Messenger::from("tg"), "Sure?")
            .with_keyboard(buttons.confirm().unwrap());
        let text = ConsoleReplier::render(&reply);

        assert!(text.contains("-> tg:5\nSure?"));
        assert!(text.contains("\n  🟢 Yes | 🔴 No\n  ⚫️ Back"));
    }

    #[test]
    fn renders_inline_payloads() {
        let mut buttons = InlineButtons::new(KeyboardLimits::default());
        buttons.add_button("Go", ButtonColor::Primary, payload! { "t" => "d" });
        let reply = Reply::new(5, Messenger::from("vk"), "Pick")
            .with_keyboard(buttons.confirm().unwrap());

        assert!(ConsoleReplier::render(&reply).ends_with(r#"Go => {"t":"d"}"#));
    }

    #[tokio::test]
    async fn reply_never_fails() {
        let reply = Reply::new(1, Messenger::from("tg"), "hi");
        ConsoleReplier::new().reply(&reply).await.unwrap();
    }
}
