//! # Shortening Rules
//!
//! Compresses identifiers so payloads fit a platform's callback-data budget.
//!
//! Keys and classifier values shorten to their first character
//! ([`ShortenedItem`]). Trigger values are snake_case phrases: each `_` segment
//! that equals a registered rule is replaced by the rule's first character
//! ([`ShortenedRuledItem`]), e.g. `go_to_third_page` -> `g_t_t_p` when all four
//! words are rules.
//!
//! ## Invariants
//!
//! - Rules are at least two characters long, so a shortened segment is never
//!   matched again. Re-applying the rules to a short form is a no-op.
//! - Explicit rules may share a first character (`to` and `third` both become
//!   `t`). Derived rules never take a character that is already claimed.
//!   Values that end up ambiguous are rejected when the payload table compiles.

use indexmap::IndexMap;
use std::hash::{Hash, Hasher};

use crate::domain::error::BuildError;

/// An identifier and its one-character code. Equality is by `item`.
#[derive(Debug, Clone, Eq)]
pub struct ShortenedItem {
    item: String,
    short_item: String,
}

impl ShortenedItem {
    pub fn new(item: impl Into<String>) -> Result<Self, BuildError> {
        let item = item.into();
        let first = item.chars().next().ok_or(BuildError::EmptyIdentifier)?;
        Ok(Self {
            short_item: first.to_string(),
            item,
        })
    }

    /// An item that keeps its full form as its code.
    pub fn verbatim(item: impl Into<String>) -> Result<Self, BuildError> {
        let item = item.into();
        if item.is_empty() {
            return Err(BuildError::EmptyIdentifier);
        }
        Ok(Self {
            short_item: item.clone(),
            item,
        })
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn short_item(&self) -> &str {
        &self.short_item
    }

    fn first_char(&self) -> Option<char> {
        self.item.chars().next()
    }
}

impl PartialEq for ShortenedItem {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item
    }
}

impl Hash for ShortenedItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item.hash(state);
    }
}

/// Registered shortening rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<ShortenedItem>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, word: &str) -> Result<(), BuildError> {
        if word.chars().count() < 2 {
            return Err(BuildError::AlreadyShort(word.to_string()));
        }
        let rule = ShortenedItem::new(word)?;
        if self.rules.contains(&rule) {
            return Err(BuildError::DuplicateRule(word.to_string()));
        }
        tracing::debug!("Added shortening rule '{}' -> '{}'", rule.item(), rule.short_item());
        self.rules.push(rule);
        Ok(())
    }

    pub fn get(&self, segment: &str) -> Option<&ShortenedItem> {
        self.rules.iter().find(|rule| rule.item() == segment)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShortenedItem> {
        self.rules.iter()
    }

    fn is_claimed(&self, word: &str) -> bool {
        let first = word.chars().next();
        self.rules.iter().any(|rule| rule.first_char() == first)
    }

    /// Derives rules from a corpus of snake_case values.
    ///
    /// Segments are ranked by frequency, then by length, ties keeping the order
    /// in which they were first seen. Walking that ranking, a segment becomes a
    /// rule when its first character is still free. Returns the new rules.
    pub fn derive<'a, I>(&mut self, values: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for value in values {
            for segment in value.split('_') {
                if segment.chars().count() >= 2 {
                    *counts.entry(segment).or_default() += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.0.chars().count().cmp(&a.0.chars().count()))
        });

        let mut added = Vec::new();
        for (segment, _) in ranked {
            if self.is_claimed(segment) {
                continue;
            }
            if self.add_rule(segment).is_ok() {
                added.push(segment.to_string());
            }
        }
        added
    }
}

/// A snake_case value compressed with the rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenedRuledItem {
    item: String,
    short_item: String,
}

impl ShortenedRuledItem {
    pub fn new(item: impl Into<String>, rules: &RuleSet) -> Result<Self, BuildError> {
        let item = item.into();
        if item.is_empty() {
            return Err(BuildError::EmptyIdentifier);
        }
        let short_item = item
            .split('_')
            .map(|segment| rules.get(segment).map_or(segment, |rule| rule.short_item()))
            .collect::<Vec<_>>()
            .join("_");
        Ok(Self { item, short_item })
    }

    /// A value that is never compressed.
    pub fn verbatim(item: impl Into<String>) -> Result<Self, BuildError> {
        let item = item.into();
        if item.is_empty() {
            return Err(BuildError::EmptyIdentifier);
        }
        Ok(Self {
            short_item: item.clone(),
            item,
        })
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn short_item(&self) -> &str {
        &self.short_item
    }
}

/// The shortening policy of one payload table.
#[derive(Debug, Clone)]
pub struct Shortening {
    enabled: bool,
    rules: RuleSet,
}

impl Default for Shortening {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: RuleSet::new(),
        }
    }
}

impl Shortening {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            rules: RuleSet::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleSet {
        &mut self.rules
    }

    pub fn item(&self, item: &str) -> Result<ShortenedItem, BuildError> {
        if self.enabled {
            ShortenedItem::new(item)
        } else {
            ShortenedItem::verbatim(item)
        }
    }

    pub fn ruled(&self, item: &str) -> Result<ShortenedRuledItem, BuildError> {
        if self.enabled {
            ShortenedRuledItem::new(item, &self.rules)
        } else {
            ShortenedRuledItem::verbatim(item)
        }
    }
}
