//! # Replies and Keyboards
//!
//! Reply descriptors produced by pages, plus the keyboard builders pages use to
//! lay out buttons. A reply carries at most one keyboard, plain or inline.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::types::{Messenger, PayloadMap, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonColor {
    #[default]
    Primary,
    Secondary,
    Positive,
    Negative,
}

impl ButtonColor {
    /// Prefix used by platforms without native button colors.
    pub fn emoji(self) -> &'static str {
        match self {
            ButtonColor::Primary => "⚪️",
            ButtonColor::Secondary => "⚫️",
            ButtonColor::Positive => "🟢",
            ButtonColor::Negative => "🔴",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub color: ButtonColor,
    pub new_line_after: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub color: ButtonColor,
    pub payload: PayloadMap,
    pub new_line_after: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    Plain(Vec<Button>),
    Inline(Vec<InlineButton>),
}

impl Keyboard {
    /// Buttons grouped into rows by their line breaks.
    pub fn rows(&self) -> Vec<Vec<(&str, ButtonColor)>> {
        let flat: Vec<(&str, ButtonColor, bool)> = match self {
            Keyboard::Plain(buttons) => buttons
                .iter()
                .map(|b| (b.label.as_str(), b.color, b.new_line_after))
                .collect(),
            Keyboard::Inline(buttons) => buttons
                .iter()
                .map(|b| (b.label.as_str(), b.color, b.new_line_after))
                .collect(),
        };
        let mut rows = vec![Vec::new()];
        for (label, color, new_line_after) in flat {
            if let Some(row) = rows.last_mut() {
                row.push((label, color));
            }
            if new_line_after {
                rows.push(Vec::new());
            }
        }
        rows.retain(|row| !row.is_empty());
        rows
    }
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub user_messenger_id: UserId,
    pub user_messenger: Messenger,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn new(user_messenger_id: UserId, user_messenger: Messenger, text: impl Into<String>) -> Self {
        Self {
            user_messenger_id,
            user_messenger,
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// All replies produced by one routing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replies(Vec<Reply>);

impl Replies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reply unless an identical one is already queued.
    pub fn add_reply(&mut self, reply: Reply) -> &mut Self {
        if !self.0.contains(&reply) {
            self.0.push(reply);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reply> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Reply> {
        self.0.iter_mut()
    }
}

impl From<Reply> for Replies {
    fn from(reply: Reply) -> Self {
        Self(vec![reply])
    }
}

impl IntoIterator for Replies {
    type Item = Reply;
    type IntoIter = std::vec::IntoIter<Reply>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Layout limits for keyboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct KeyboardLimits {
    #[serde(default = "default_max_in_row")]
    pub max_buttons_in_row: usize,
    #[serde(default = "default_max_amount")]
    pub max_buttons_amount: usize,
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_max_in_row() -> usize {
    4
}
fn default_max_amount() -> usize {
    40
}
fn default_max_rows() -> usize {
    10
}

impl Default for KeyboardLimits {
    fn default() -> Self {
        Self {
            max_buttons_in_row: default_max_in_row(),
            max_buttons_amount: default_max_amount(),
            max_rows: default_max_rows(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyboardError {
    #[error("can't {0}, no buttons in list")]
    Empty(&'static str),
    #[error("too many buttons: {0}")]
    TooManyButtons(usize),
    #[error("too many rows: {0}")]
    TooManyRows(usize),
}

/// A button that can be laid out by [`KeyboardBuilder`].
pub trait LayoutButton: Sized {
    fn set_new_line_after(&mut self, value: bool);
    fn into_keyboard(buttons: Vec<Self>) -> Keyboard;
}

impl LayoutButton for Button {
    fn set_new_line_after(&mut self, value: bool) {
        self.new_line_after = value;
    }

    fn into_keyboard(buttons: Vec<Self>) -> Keyboard {
        Keyboard::Plain(buttons)
    }
}

impl LayoutButton for InlineButton {
    fn set_new_line_after(&mut self, value: bool) {
        self.new_line_after = value;
    }

    fn into_keyboard(buttons: Vec<Self>) -> Keyboard {
        Keyboard::Inline(buttons)
    }
}

/// Row-aware keyboard builder.
#[derive(Debug, Clone)]
pub struct KeyboardBuilder<B> {
    buttons: Vec<B>,
    limits: KeyboardLimits,
    since_new_line: usize,
    rows: usize,
}

pub type Buttons = KeyboardBuilder<Button>;
pub type InlineButtons = KeyboardBuilder<InlineButton>;

impl<B: LayoutButton> KeyboardBuilder<B> {
    pub fn new(limits: KeyboardLimits) -> Self {
        Self {
            buttons: Vec::new(),
            limits,
            since_new_line: 0,
            rows: 0,
        }
    }

    fn push(&mut self, button: B) {
        if self.since_new_line >= self.limits.max_buttons_in_row {
            // a full row always has a last button
            let _ = self.add_line();
        }
        self.since_new_line += 1;
        self.buttons.push(button);
    }

    /// Breaks the row after the last button.
    pub fn add_line(&mut self) -> Result<&mut Self, KeyboardError> {
        let last = self
            .buttons
            .last_mut()
            .ok_or(KeyboardError::Empty("add new line"))?;
        last.set_new_line_after(true);
        self.since_new_line = 0;
        self.rows += 1;
        Ok(self)
    }

    pub fn remove_last_button(&mut self) -> Result<&mut Self, KeyboardError> {
        self.buttons
            .pop()
            .ok_or(KeyboardError::Empty("remove last button"))?;
        self.since_new_line = self.since_new_line.saturating_sub(1);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Validates the layout and produces the keyboard.
    pub fn confirm(mut self) -> Result<Keyboard, KeyboardError> {
        if self.buttons.len() > self.limits.max_buttons_amount {
            return Err(KeyboardError::TooManyButtons(self.buttons.len()));
        }
        if self.rows > self.limits.max_rows {
            return Err(KeyboardError::TooManyRows(self.rows));
        }
        if let Some(last) = self.buttons.last_mut() {
            last.set_new_line_after(false);
        }
        Ok(B::into_keyboard(self.buttons))
    }
}

impl KeyboardBuilder<Button> {
    pub fn add_button(&mut self, label: impl Into<String>, color: ButtonColor) -> &mut Self {
        self.push(Button {
            label: label.into(),
            color,
            new_line_after: false,
        });
        self
    }
}

impl KeyboardBuilder<InlineButton> {
    pub fn add_button(
        &mut self,
        label: impl Into<String>,
        color: ButtonColor,
        payload: PayloadMap,
    ) -> &mut Self {
        self.push(InlineButton {
            label: label.into(),
            color,
            payload,
            new_line_after: false,
        });
        self
    }
}
