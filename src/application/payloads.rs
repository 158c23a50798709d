//! # Payload Codec
//!
//! Inline buttons carry a small dictionary back to the bot when pressed. This
//! module defines the accepted dictionary shapes, compresses outbound ones so
//! they fit the platform's callback-data budget and expands inbound ones into
//! a routing decision.
//!
//! Shapes are declared with a path grammar, `key:value/key:value/key:`:
//!
//! - the first pair is the classifier; every shape uses the same classifier key
//! - further pairs with a value are triggers and must match literally
//! - pairs without a value are data slots and carry anything
//!
//! Shapes that share a classifier value form a classification and must agree on
//! how many triggers and data slots they have.
//!
//! [`Payloads`] is the builder. [`Payloads::compile`] consumes it and returns
//! the read-only [`CompiledPayloads`] used while serving.

use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};

use crate::application::route::Route;
use crate::application::shortening::{Shortening, ShortenedItem, ShortenedRuledItem};
use crate::domain::error::BuildError;
use crate::domain::traits::Handler;
use crate::domain::types::{ANY, PayloadBudget, PayloadMap, PayloadValue, encoded_len};

/// A payload path split into its parts, before shortening.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedPath {
    path: String,
    main_key: String,
    main_value: String,
    triggers: Vec<(String, String)>,
    data: Vec<String>,
}

impl ParsedPath {
    fn parse(path: &str) -> Result<Self, BuildError> {
        let malformed = |reason: String| BuildError::MalformedPath {
            path: path.to_string(),
            reason,
        };

        let mut pairs = Vec::new();
        for segment in path.trim_matches('/').split('/') {
            let (key, value) = segment
                .split_once(':')
                .ok_or_else(|| malformed(format!("'{segment}' is not a key:value pair")))?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                return Err(malformed(format!("'{segment}' has an empty key")));
            }
            pairs.push((key.to_string(), value.to_string()));
        }

        let mut pairs = pairs.into_iter();
        let (main_key, main_value) = pairs
            .next()
            .ok_or_else(|| malformed("no pairs".to_string()))?;
        if main_value.is_empty() {
            return Err(malformed(format!("classifier '{main_key}' needs a value")));
        }

        let mut triggers = Vec::new();
        let mut data = Vec::new();
        for (key, value) in pairs {
            if value.is_empty() {
                data.push(key);
            } else {
                triggers.push((key, value));
            }
        }

        Ok(Self {
            path: path.to_string(),
            main_key,
            main_value,
            triggers,
            data,
        })
    }

    /// Identity of the shape, independent of where it routes.
    fn same_shape(&self, other: &Self) -> bool {
        let sorted = |p: &Self| {
            let mut triggers = p.triggers.clone();
            triggers.sort();
            let mut data = p.data.clone();
            data.sort();
            (triggers, data)
        };
        self.main_key == other.main_key
            && self.main_value == other.main_value
            && sorted(self) == sorted(other)
    }
}

/// A fixed field of a payload shape.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub key: ShortenedItem,
    pub value: ShortenedRuledItem,
}

/// One compiled payload shape and where it routes.
#[derive(Debug, Clone)]
pub struct Payload {
    parsed: ParsedPath,
    main_key: ShortenedItem,
    main_value: ShortenedItem,
    triggers: Vec<Trigger>,
    data: Vec<ShortenedItem>,
    from_stage: String,
    to_stage: Handler,
    route: Route,
    space_for_data: usize,
}

impl Payload {
    fn build(
        parsed: ParsedPath,
        from_stage: String,
        to_stage: Handler,
        route: Route,
        shortening: &Shortening,
        budget: PayloadBudget,
    ) -> Result<Self, BuildError> {
        let main_key = shortening.item(&parsed.main_key)?;
        let main_value = shortening.item(&parsed.main_value)?;
        let triggers = parsed
            .triggers
            .iter()
            .map(|(key, value)| {
                Ok(Trigger {
                    key: shortening.item(key)?,
                    value: shortening.ruled(value)?,
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;
        let data = parsed
            .data
            .iter()
            .map(|key| shortening.item(key))
            .collect::<Result<Vec<_>, BuildError>>()?;

        let mut seen = HashSet::new();
        let keys = std::iter::once(&main_key)
            .chain(triggers.iter().map(|t| &t.key))
            .chain(data.iter());
        for key in keys {
            if !seen.insert(key.short_item()) {
                return Err(BuildError::DuplicateKey {
                    path: parsed.path.clone(),
                    key: key.short_item().to_string(),
                });
            }
        }

        let mut payload = Self {
            parsed,
            main_key,
            main_value,
            triggers,
            data,
            from_stage,
            to_stage,
            route,
            space_for_data: 0,
        };

        let size = encoded_len(&payload.reference());
        let Some(space) = budget.bytes().checked_sub(size) else {
            return Err(BuildError::BudgetExceeded {
                path: payload.parsed.path,
                size,
                budget: budget.bytes(),
            });
        };
        payload.space_for_data = space;
        Ok(payload)
    }

    /// The short form with every data slot holding a one-byte placeholder.
    fn reference(&self) -> PayloadMap {
        let mut map = crate::payload! { self.main_key.short_item() => self.main_value.short_item() };
        for trigger in &self.triggers {
            map.insert(
                trigger.key.short_item().to_string(),
                PayloadValue::from(trigger.value.short_item()),
            );
        }
        for key in &self.data {
            map.insert(key.short_item().to_string(), PayloadValue::Int(0));
        }
        map
    }

    fn rebuilt(&self, shortening: &Shortening, budget: PayloadBudget) -> Result<Self, BuildError> {
        Self::build(
            self.parsed.clone(),
            self.from_stage.clone(),
            self.to_stage.clone(),
            self.route.clone(),
            shortening,
            budget,
        )
    }

    fn short_keys(&self) -> BTreeSet<&str> {
        self.triggers
            .iter()
            .map(|t| t.key.short_item())
            .chain(self.data.iter().map(ShortenedItem::short_item))
            .collect()
    }

    /// Whether one inbound dictionary could match both shapes: the same short
    /// keys, and no shared trigger key with different literals.
    fn overlaps(&self, other: &Self) -> bool {
        if self.short_keys() != other.short_keys() {
            return false;
        }
        self.triggers.iter().all(|a| {
            other
                .triggers
                .iter()
                .filter(|b| b.key.short_item() == a.key.short_item())
                .all(|b| b.value.short_item() == a.value.short_item())
        })
    }

    fn field_count(&self) -> usize {
        self.triggers.len() + self.data.len()
    }

    pub fn path(&self) -> &str {
        &self.parsed.path
    }

    pub fn main_key(&self) -> &ShortenedItem {
        &self.main_key
    }

    pub fn main_value(&self) -> &ShortenedItem {
        &self.main_value
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn data_keys(&self) -> &[ShortenedItem] {
        &self.data
    }

    pub fn from_stage(&self) -> &str {
        &self.from_stage
    }

    pub fn to_stage(&self) -> &Handler {
        &self.to_stage
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Bytes left for data values once the fixed part is encoded.
    pub fn space_for_data(&self) -> usize {
        self.space_for_data
    }
}

/// All shapes sharing one classifier value.
#[derive(Debug, Clone)]
struct Classification {
    main_value: ShortenedItem,
    trigger_count: usize,
    data_count: usize,
    variants: Vec<Payload>,
}

/// Payload table under construction.
#[derive(Debug, Clone)]
pub struct Payloads {
    budget: PayloadBudget,
    shortening: Shortening,
    main_key: Option<String>,
    classifications: IndexMap<String, Classification>,
    error: Option<Payload>,
}

impl Payloads {
    pub fn new(budget: PayloadBudget) -> Self {
        Self {
            budget,
            shortening: Shortening::default(),
            main_key: None,
            classifications: IndexMap::new(),
            error: None,
        }
    }

    /// A table whose short forms equal the full forms.
    pub fn without_shortening(budget: PayloadBudget) -> Self {
        Self {
            shortening: Shortening::disabled(),
            ..Self::new(budget)
        }
    }

    pub fn budget(&self) -> PayloadBudget {
        self.budget
    }

    fn has_payloads(&self) -> bool {
        !self.classifications.is_empty() || self.error.is_some()
    }

    pub fn add_rule(&mut self, word: &str) -> Result<(), BuildError> {
        if self.has_payloads() {
            return Err(BuildError::RulesAfterPayloads(word.to_string()));
        }
        self.shortening.rules_mut().add_rule(word)
    }

    pub fn add_rules(&mut self, words: &[&str]) -> Result<(), BuildError> {
        words.iter().try_for_each(|word| self.add_rule(word))
    }

    /// Derives rules from the trigger values added so far. Returns the new rules.
    pub fn apply_rules(&mut self) -> Vec<String> {
        let corpus: Vec<String> = self
            .classifications
            .values()
            .flat_map(|c| c.variants.iter())
            .chain(self.error.iter())
            .flat_map(|p| p.parsed.triggers.iter().map(|(_, value)| value.clone()))
            .collect();
        let added = self
            .shortening
            .rules_mut()
            .derive(corpus.iter().map(String::as_str));
        tracing::debug!("Derived {} shortening rule(s): {:?}", added.len(), added);
        added
    }

    fn check_main_key(&mut self, parsed: &ParsedPath) -> Result<(), BuildError> {
        match &self.main_key {
            Some(expected) if *expected != parsed.main_key => Err(BuildError::WrongMainKey {
                expected: expected.clone(),
                found: parsed.main_key.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                self.main_key = Some(parsed.main_key.clone());
                Ok(())
            }
        }
    }

    /// Fails when `payload`'s short classifier value is taken by another value.
    fn check_main_value(&self, payload: &Payload, is_error: bool) -> Result<(), BuildError> {
        let short = payload.main_value().short_item();
        let others = self
            .classifications
            .values()
            .map(|c| &c.main_value)
            .filter(|other| is_error || other.item() != payload.main_value().item())
            .chain(self.error.iter().map(Payload::main_value));
        for other in others {
            if other.short_item() == short {
                return Err(BuildError::ShortCollision {
                    item: payload.main_value().item().to_string(),
                    other: other.item().to_string(),
                    short: short.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn add_payload(
        &mut self,
        path: &str,
        from_stage: &str,
        to_stage: Handler,
        route: Route,
    ) -> Result<(), BuildError> {
        let parsed = ParsedPath::parse(path)?;
        self.check_main_key(&parsed)?;

        if let Some(classification) = self.classifications.get(&parsed.main_value) {
            if classification
                .variants
                .iter()
                .any(|p| p.parsed.same_shape(&parsed))
            {
                return Err(BuildError::DuplicatePayload(path.to_string()));
            }
            if classification.trigger_count != parsed.triggers.len()
                || classification.data_count != parsed.data.len()
            {
                return Err(BuildError::ArityMismatch {
                    path: path.to_string(),
                    expected_triggers: classification.trigger_count,
                    expected_data: classification.data_count,
                    found_triggers: parsed.triggers.len(),
                    found_data: parsed.data.len(),
                });
            }
        }

        let payload = Payload::build(
            parsed,
            from_stage.to_string(),
            to_stage,
            route,
            &self.shortening,
            self.budget,
        )?;
        self.check_main_value(&payload, false)?;

        tracing::debug!(
            "Added payload '{}' from '{}' to '{}' ({} byte(s) left for data)",
            payload.path(),
            payload.from_stage(),
            payload.to_stage().name(),
            payload.space_for_data()
        );

        let key = payload.main_value().item().to_string();
        let classification = self
            .classifications
            .entry(key)
            .or_insert_with(|| Classification {
                main_value: payload.main_value().clone(),
                trigger_count: payload.triggers().len(),
                data_count: payload.data_keys().len(),
                variants: Vec::new(),
            });
        classification.variants.push(payload);
        Ok(())
    }

    /// Sets the payload every unmatched input degrades to.
    pub fn add_error_payload(&mut self, path: &str, to_stage: Handler) -> Result<(), BuildError> {
        if self.error.is_some() {
            return Err(BuildError::DuplicateErrorPayload);
        }
        let parsed = ParsedPath::parse(path)?;
        self.check_main_key(&parsed)?;
        let payload = Payload::build(
            parsed,
            ANY.to_string(),
            to_stage,
            Route::default(),
            &self.shortening,
            self.budget,
        )?;
        self.check_main_value(&payload, true)?;
        tracing::debug!("Added error payload '{}'", payload.path());
        self.error = Some(payload);
        Ok(())
    }

    /// Retracts a payload added earlier. Derived rules are kept.
    pub fn remove_payload(&mut self, path: &str) -> Result<(), BuildError> {
        let parsed = ParsedPath::parse(path)?;
        let unknown = || BuildError::UnknownPayload(path.to_string());

        let classification = self
            .classifications
            .get_mut(&parsed.main_value)
            .ok_or_else(unknown)?;
        let index = classification
            .variants
            .iter()
            .position(|p| p.parsed.same_shape(&parsed))
            .ok_or_else(unknown)?;
        classification.variants.remove(index);
        if classification.variants.is_empty() {
            self.classifications.shift_remove(&parsed.main_value);
        }
        tracing::debug!("Removed payload '{}'", path);
        Ok(())
    }

    pub fn compile(self) -> Result<CompiledPayloads, BuildError> {
        let error = self.error.ok_or(BuildError::MissingErrorPayload)?;
        if self.classifications.is_empty() {
            return Err(BuildError::NoPayloads);
        }
        let main_key = self
            .shortening
            .item(self.main_key.as_deref().unwrap_or(&error.parsed.main_key))?;

        let error = error.rebuilt(&self.shortening, self.budget)?;
        let mut classifications = IndexMap::with_capacity(self.classifications.len());
        for (value, classification) in self.classifications {
            let variants = classification
                .variants
                .iter()
                .map(|p| p.rebuilt(&self.shortening, self.budget))
                .collect::<Result<Vec<_>, BuildError>>()?;

            for (i, a) in variants.iter().enumerate() {
                for b in &variants[i + 1..] {
                    if a.overlaps(b) {
                        return Err(BuildError::ShortCollision {
                            item: a.path().to_string(),
                            other: b.path().to_string(),
                            short: render(&a.reference()),
                        });
                    }
                }
            }

            classifications.insert(
                classification.main_value.short_item().to_string(),
                Classification {
                    variants,
                    ..classification
                },
            );
            tracing::debug!("Classification '{}' compiled", value);
        }

        tracing::info!(
            "Compiled {} payload classification(s) with {} rule(s), budget {} bytes",
            classifications.len(),
            self.shortening.rules().len(),
            self.budget.bytes()
        );

        Ok(CompiledPayloads {
            budget: self.budget,
            main_key,
            classifications,
            error,
        })
    }
}

fn render(map: &PayloadMap) -> String {
    crate::domain::types::to_callback_data(map)
}

/// Result of decoding an inbound payload.
#[derive(Debug, Clone)]
pub struct Decoded<'a> {
    pub definition: &'a Payload,
    /// The payload with full keys and values.
    pub full: PayloadMap,
    /// `false` when the input fell back to the error payload.
    pub matched: bool,
}

impl Decoded<'_> {
    pub fn dst(&self) -> &Handler {
        self.definition.to_stage()
    }

    pub fn src(&self) -> &str {
        self.definition.from_stage()
    }
}

/// Read-only payload table.
#[derive(Debug, Clone)]
pub struct CompiledPayloads {
    budget: PayloadBudget,
    main_key: ShortenedItem,
    /// Keyed by short classifier value.
    classifications: IndexMap<String, Classification>,
    error: Payload,
}

impl CompiledPayloads {
    pub fn budget(&self) -> PayloadBudget {
        self.budget
    }

    pub fn error_payload(&self) -> &Payload {
        &self.error
    }

    /// All shapes of the classification with the full value `main_value`.
    pub fn variants(&self, main_value: &str) -> Option<&[Payload]> {
        self.classifications
            .values()
            .find(|c| c.main_value.item() == main_value)
            .map(|c| c.variants.as_slice())
    }

    pub fn payloads(&self) -> impl Iterator<Item = &Payload> {
        self.classifications.values().flat_map(|c| c.variants.iter())
    }

    /// Encoded form of the error payload.
    pub fn error_short(&self) -> PayloadMap {
        crate::payload! { self.main_key.short_item() => self.error.main_value().short_item() }
    }

    fn error_full(&self) -> PayloadMap {
        crate::payload! { self.main_key.item() => self.error.main_value().item() }
    }

    /// Compresses a full payload for an outbound button.
    ///
    /// Never fails: anything that does not fit a declared shape, or whose data
    /// overflows the budget, encodes as the error payload.
    pub fn shorten(&self, full: &PayloadMap) -> PayloadMap {
        match self.try_shorten(full) {
            Ok(short) => short,
            Err(reason) => {
                tracing::warn!(
                    "Payload {} can't be encoded ({}), sending error payload",
                    render(full),
                    reason
                );
                self.error_short()
            }
        }
    }

    fn try_shorten(&self, full: &PayloadMap) -> Result<PayloadMap, String> {
        let (key, value) = full.first().ok_or("payload is empty")?;
        if key != self.main_key.item() {
            return Err(format!("classifier key '{key}' is unknown"));
        }
        let value = value.as_str().ok_or("classifier value isn't text")?;
        let classification = self
            .classifications
            .values()
            .find(|c| c.main_value.item() == value)
            .ok_or_else(|| format!("classification '{value}' is unknown"))?;

        let fields = full.len() - 1;
        let payload = classification
            .variants
            .iter()
            .find(|p| {
                p.field_count() == fields
                    && p.triggers.iter().all(|t| {
                        full.get(t.key.item()).and_then(PayloadValue::as_str) == Some(t.value.item())
                    })
                    && p.data.iter().all(|d| full.contains_key(d.item()))
            })
            .ok_or("no shape matches the triggers")?;

        let mut short = payload.reference();
        let mut data_size = 0;
        for key in &payload.data {
            if let Some(value) = full.get(key.item()) {
                data_size += value.encoded_len().saturating_sub(1);
                short.insert(key.short_item().to_string(), value.clone());
            }
        }
        if data_size > payload.space_for_data {
            return Err(format!(
                "data needs {} more byte(s), {} available",
                data_size, payload.space_for_data
            ));
        }
        Ok(short)
    }

    /// Expands an inbound short payload into its definition and full form.
    pub fn decode(&self, short: &PayloadMap) -> Decoded<'_> {
        match self.try_decode(short) {
            Some((definition, full)) => Decoded {
                definition,
                full,
                matched: true,
            },
            None => {
                tracing::warn!("Payload {} matches no definition", render(short));
                Decoded {
                    definition: &self.error,
                    full: self.error_full(),
                    matched: false,
                }
            }
        }
    }

    fn try_decode(&self, short: &PayloadMap) -> Option<(&Payload, PayloadMap)> {
        let (key, value) = short.first()?;
        if key != self.main_key.short_item() {
            return None;
        }
        let classification = self.classifications.get(value.as_str()?)?;

        let fields = short.len() - 1;
        let payload = classification.variants.iter().find(|p| {
            p.field_count() == fields
                && p.triggers.iter().all(|t| {
                    short.get(t.key.short_item()).and_then(PayloadValue::as_str)
                        == Some(t.value.short_item())
                })
                && p.data.iter().all(|d| short.contains_key(d.short_item()))
        })?;

        let mut full = crate::payload! { self.main_key.item() => payload.main_value.item() };
        for trigger in &payload.triggers {
            full.insert(
                trigger.key.item().to_string(),
                PayloadValue::from(trigger.value.item()),
            );
        }
        for key in &payload.data {
            let value = short.get(key.short_item())?.clone();
            full.insert(key.item().to_string(), value);
        }
        Some((payload, full))
    }
}
