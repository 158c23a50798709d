//! # Domain Types
//!
//! Common data structures used across the routing core: platform tags, payload
//! dictionaries, access sets and the inbound message model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wildcard accepted as a stage or an access level.
pub const ANY: &str = "any";

/// Platform-side user id (chat id on Telegram, peer id on VK).
pub type UserId = i64;

/// Tag of the chat platform a user belongs to, e.g. `tg` or `vk`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Messenger(String);

impl Messenger {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Messenger {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for Messenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single payload value. Literal fields are strings, data slots usually hold
/// integers or strings. Anything else a client sends is kept as raw JSON so
/// the payload still reaches routing and degrades to the error payload there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Int(i64),
    Text(String),
    Other(serde_json::Value),
}

impl PayloadValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PayloadValue::Text(text) => Some(text),
            PayloadValue::Int(_) | PayloadValue::Other(_) => None,
        }
    }

    /// Size of this value once serialized on the wire.
    pub fn encoded_len(&self) -> usize {
        serde_json::to_vec(self).map(|b| b.len()).unwrap_or(usize::MAX)
    }
}

impl From<&str> for PayloadValue {
    fn from(text: &str) -> Self {
        PayloadValue::Text(text.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(text: String) -> Self {
        PayloadValue::Text(text)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::Int(value)
    }
}

impl fmt::Display for PayloadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadValue::Int(value) => write!(f, "{value}"),
            PayloadValue::Text(text) => f.write_str(text),
            PayloadValue::Other(value) => write!(f, "{value}"),
        }
    }
}

/// Ordered payload dictionary. The first entry is always the classifier.
pub type PayloadMap = IndexMap<String, PayloadValue>;

/// Builds a [`PayloadMap`] from `key => value` pairs, keeping their order.
#[macro_export]
macro_rules! payload {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::domain::types::PayloadMap::new();
        $(map.insert(String::from($key), $crate::domain::types::PayloadValue::from($value));)*
        map
    }};
}

/// Byte length of a payload dictionary as it travels in callback data.
pub fn encoded_len(map: &PayloadMap) -> usize {
    serde_json::to_vec(map).map(|b| b.len()).unwrap_or(usize::MAX)
}

/// Serializes a payload dictionary into platform callback data.
pub fn to_callback_data(map: &PayloadMap) -> String {
    serde_json::to_string(map).unwrap_or_default()
}

/// Parses platform callback data back into a payload dictionary.
pub fn from_callback_data(data: &str) -> Option<PayloadMap> {
    serde_json::from_str(data).ok()
}

/// Maximum callback-data size a platform accepts for one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadBudget(usize);

impl PayloadBudget {
    pub const TELEGRAM: Self = Self(64);
    pub const VK: Self = Self(255);
    pub const UNCONSTRAINED: Self = Self(1000);

    pub const fn new(bytes: usize) -> Self {
        Self(bytes)
    }

    pub const fn bytes(self) -> usize {
        self.0
    }

    pub fn for_messenger(tag: &str) -> Self {
        match tag {
            "tg" => Self::TELEGRAM,
            "vk" => Self::VK,
            _ => Self::UNCONSTRAINED,
        }
    }
}

impl Default for PayloadBudget {
    fn default() -> Self {
        Self::UNCONSTRAINED
    }
}

/// Set of access levels a transition admits. Containing [`ANY`] admits everyone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessLevels(Vec<String>);

impl AccessLevels {
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        if levels.is_empty() {
            return Self::default();
        }
        Self(levels)
    }

    pub fn is_any(&self) -> bool {
        self.0.iter().any(|level| level == ANY)
    }

    pub fn permits(&self, level: &str) -> bool {
        self.is_any() || self.0.iter().any(|l| l == level)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for AccessLevels {
    fn default() -> Self {
        Self(vec![ANY.to_string()])
    }
}

impl From<&str> for AccessLevels {
    fn from(level: &str) -> Self {
        Self::new([level])
    }
}

impl From<Vec<&str>> for AccessLevels {
    fn from(levels: Vec<&str>) -> Self {
        Self::new(levels)
    }
}

impl<const N: usize> From<[&str; N]> for AccessLevels {
    fn from(levels: [&str; N]) -> Self {
        Self::new(levels)
    }
}

impl fmt::Display for AccessLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// A file uploaded by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

/// What the user sent. Routing dispatches on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Payload(PayloadMap),
    File {
        caption: Option<String>,
        files: Vec<FileAttachment>,
    },
}

/// An inbound event after front-end normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub user_id: UserId,
    pub messenger: Messenger,
    pub content: MessageContent,
}

/// Inbound message as front-end clients put it on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub user_id: UserId,
    pub messenger: Messenger,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub payload: Option<PayloadMap>,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
}

impl InboundMessage {
    /// Resolves the wire fields into one content variant.
    ///
    /// A payload always wins: when text arrives together with a payload the
    /// text is dropped. Files keep the text as their caption.
    pub fn into_message(self) -> Option<Message> {
        let content = if let Some(payload) = self.payload {
            MessageContent::Payload(payload)
        } else if !self.files.is_empty() {
            MessageContent::File {
                caption: self.text,
                files: self.files,
            }
        } else {
            MessageContent::Text(self.text?)
        };
        Some(Message {
            user_id: self.user_id,
            messenger: self.messenger,
            content,
        })
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
