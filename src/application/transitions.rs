//! # Transitions and Router
//!
//! The per-user conversation is a state machine whose states are stage names.
//! Edges are text triggers registered on [`Transitions`]; inline-button edges
//! come from the compiled payload table. After [`Transitions::compile`] every
//! known stage has exactly one default edge, synthesized towards the error
//! page where none was registered, and the resulting [`Router`] is read-only.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::application::payloads::CompiledPayloads;
use crate::application::route::Route;
use crate::domain::error::BuildError;
use crate::domain::reply::Replies;
use crate::domain::traits::{AccessStore, Handler, StageStore, same_page};
use crate::domain::types::{ANY, MessageContent, Messenger, PayloadMap, UserId};

/// One edge of the state machine. A `None` trigger is the stage's default.
#[derive(Debug, Clone)]
pub struct Transition {
    trigger: Option<String>,
    from_stage: String,
    to_stage: Handler,
    route: Route,
}

impl Transition {
    pub fn trigger(&self) -> Option<&str> {
        self.trigger.as_deref()
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

    fn describe(&self) -> String {
        format!(
            "'{}' --{}--> '{}' [{}]",
            self.from_stage,
            self.trigger.as_deref().unwrap_or("*"),
            self.to_stage.name(),
            self.route.access_level
        )
    }
}

/// Transition table under construction.
#[derive(Debug, Default)]
pub struct Transitions {
    transitions: Vec<Transition>,
    error_return: Option<Handler>,
    payloads: Option<CompiledPayloads>,
}

impl Transitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes inline-button payloads through `payloads`.
    pub fn with_payloads(mut self, payloads: CompiledPayloads) -> Self {
        self.payloads = Some(payloads);
        self
    }

    /// Registers one edge. Triggers are matched case-insensitively.
    pub fn add_transition(
        &mut self,
        trigger: Option<&str>,
        from_stage: &str,
        to_stage: Handler,
        route: Route,
    ) -> Result<(), BuildError> {
        let transition = Transition {
            trigger: trigger.map(str::to_lowercase),
            from_stage: from_stage.to_string(),
            to_stage,
            route,
        };

        if transition.trigger.is_none() && transition.from_stage == ANY {
            return Err(BuildError::WildcardDefault);
        }

        for existing in self
            .transitions
            .iter()
            .filter(|t| t.from_stage == transition.from_stage)
        {
            if existing.trigger.is_none() && transition.trigger.is_none() {
                return Err(BuildError::MultipleDefaults(transition.from_stage.clone()));
            }
            if existing.trigger == transition.trigger
                && existing.route.access_level == transition.route.access_level
            {
                return Err(BuildError::DuplicateTransition(transition.describe()));
            }
            if existing.trigger.is_none() != transition.trigger.is_none()
                && same_page(&existing.to_stage, &transition.to_stage)
            {
                return Err(BuildError::RealizedByOtherTrigger {
                    from_stage: transition.from_stage.clone(),
                    to_stage: transition.to_stage.name().to_string(),
                });
            }
        }

        tracing::debug!("Added transition {}", transition.describe());
        self.transitions.push(transition);
        Ok(())
    }

    /// Sets the page every unmatched input lands on.
    pub fn add_error_return(&mut self, to_stage: Handler) -> Result<(), BuildError> {
        if self.error_return.is_some() {
            return Err(BuildError::DuplicateErrorHandler);
        }
        self.error_return = Some(to_stage);
        Ok(())
    }

    pub fn compile(self) -> Result<Router, BuildError> {
        let error_return = self.error_return.ok_or(BuildError::MissingErrorHandler)?;
        if self.transitions.is_empty() {
            return Err(BuildError::NoTransitions);
        }

        let mut names = BTreeSet::new();
        for transition in &self.transitions {
            names.insert(transition.from_stage.as_str());
            if let Some(stage) = &transition.route.to_stage_id {
                names.insert(stage.as_str());
            }
        }
        if let Some(payloads) = &self.payloads {
            for payload in payloads.payloads() {
                names.insert(payload.from_stage());
                if let Some(stage) = &payload.route().to_stage_id {
                    names.insert(stage.as_str());
                }
            }
        }
        names.remove(ANY);

        let fallback = |stage: &str| Transition {
            trigger: None,
            from_stage: stage.to_string(),
            to_stage: error_return.clone(),
            route: Route::default(),
        };

        let mut stages = BTreeMap::new();
        let mut synthesized = 0;
        for name in names {
            let mut transitions = Vec::new();
            let mut default = None;
            for transition in self.transitions.iter().filter(|t| t.from_stage == name) {
                if transition.trigger.is_some() {
                    transitions.push(transition.clone());
                } else {
                    default = Some(transition.clone());
                }
            }
            let default = default.unwrap_or_else(|| {
                synthesized += 1;
                fallback(name)
            });
            stages.insert(
                name.to_string(),
                StageTable {
                    transitions,
                    default,
                },
            );
        }

        let any_stage: Vec<Transition> = self
            .transitions
            .iter()
            .filter(|t| t.from_stage == ANY)
            .cloned()
            .collect();

        tracing::info!(
            "Compiled {} transition(s) over {} stage(s), {} default(s) sent to '{}'",
            self.transitions.len(),
            stages.len(),
            synthesized,
            error_return.name()
        );

        Ok(Router {
            error: fallback(ANY),
            stages,
            any_stage,
            payloads: self.payloads,
        })
    }
}

#[derive(Debug, Clone)]
struct StageTable {
    transitions: Vec<Transition>,
    default: Transition,
}

/// The user a message is routed for.
#[derive(Debug, Clone, Copy)]
pub struct UserContext<'a> {
    pub user_messenger_id: UserId,
    pub user_messenger: &'a Messenger,
    pub stage: &'a str,
    pub access_level: &'a str,
}

/// Read-only routing table.
#[derive(Debug)]
pub struct Router {
    stages: BTreeMap<String, StageTable>,
    any_stage: Vec<Transition>,
    error: Transition,
    payloads: Option<CompiledPayloads>,
}

fn emoji() -> &'static Regex {
    static EMOJI: OnceLock<Regex> = OnceLock::new();
    EMOJI.get_or_init(|| {
        Regex::new(
            r"[\p{Extended_Pictographic}\x{1F3FB}-\x{1F3FF}\x{1F1E6}-\x{1F1FF}\x{FE0E}\x{FE0F}\x{200D}\x{20E3}]",
        )
        .expect("emoji pattern compiles")
    })
}

/// Strips emoji and surrounding whitespace from user text.
///
/// Text platforms echo a tapped button's label, which carries the color emoji
/// and a separating space (`🟢 Start`). Trimming lets that echo match the
/// `start` trigger. Inner whitespace is kept, so `go  back` stays distinct
/// from `go back`.
pub fn clean_text(text: &str) -> String {
    emoji().replace_all(text, "").trim().to_string()
}

impl Router {
    pub fn payloads(&self) -> Option<&CompiledPayloads> {
        self.payloads.as_ref()
    }

    pub fn stages(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }

    pub fn default_for(&self, stage: &str) -> Option<&Transition> {
        self.stages.get(stage).map(|table| &table.default)
    }

    /// Picks the edge a text message takes.
    ///
    /// The stage's own triggers come first in registration order, then the
    /// wildcard-stage triggers, then the stage default. Access levels gate
    /// triggered edges only.
    pub fn select(&self, stage: &str, trigger: &str, access_level: &str) -> &Transition {
        let table = self.stages.get(stage);
        table
            .into_iter()
            .flat_map(|t| t.transitions.iter())
            .chain(self.any_stage.iter())
            .find(|t| t.trigger.as_deref() == Some(trigger) && t.route.permits(access_level))
            .or(table.map(|t| &t.default))
            .unwrap_or(&self.error)
    }

    /// Routes one message and returns what the destination page replied.
    ///
    /// Unmatched input lands on an error page; only store failures are errors.
    pub async fn run(
        &self,
        content: MessageContent,
        user: &UserContext<'_>,
        stages: Option<&dyn StageStore>,
        access: Option<&dyn AccessStore>,
    ) -> anyhow::Result<Replies> {
        let (id, messenger) = (user.user_messenger_id, user.user_messenger);
        match content {
            MessageContent::Text(text) => {
                let text = clean_text(&text);
                let transition = self.select(user.stage, &text.to_lowercase(), user.access_level);
                tracing::debug!(
                    "{}:{} at '{}' sent '{}', taking {}",
                    messenger,
                    id,
                    user.stage,
                    text,
                    transition.describe()
                );
                transition.route.apply(id, messenger, stages, access).await?;
                Ok(transition
                    .to_stage
                    .call(id, messenger, MessageContent::Text(text))
                    .await)
            }
            MessageContent::Payload(short) => self.run_payload(short, user, stages, access).await,
            file @ MessageContent::File { .. } => {
                let transition = self.default_for(user.stage).unwrap_or(&self.error);
                tracing::debug!(
                    "{}:{} at '{}' sent files, taking {}",
                    messenger,
                    id,
                    user.stage,
                    transition.describe()
                );
                transition.route.apply(id, messenger, stages, access).await?;
                Ok(transition.to_stage.call(id, messenger, file).await)
            }
        }
    }

    async fn run_payload(
        &self,
        short: PayloadMap,
        user: &UserContext<'_>,
        stages: Option<&dyn StageStore>,
        access: Option<&dyn AccessStore>,
    ) -> anyhow::Result<Replies> {
        let (id, messenger) = (user.user_messenger_id, user.user_messenger);
        let Some(payloads) = &self.payloads else {
            tracing::warn!("{}:{} sent a payload but no payloads are configured", messenger, id);
            return Ok(self.error.to_stage.call(id, messenger, MessageContent::Payload(short)).await);
        };

        let decoded = payloads.decode(&short);
        if decoded.src() != user.stage && decoded.src() != ANY {
            tracing::warn!(
                "{}:{} pressed a '{}' button at '{}'",
                messenger,
                id,
                decoded.src(),
                user.stage
            );
            return Ok(self
                .error
                .to_stage
                .call(id, messenger, MessageContent::Payload(decoded.full))
                .await);
        }
        let route = decoded.definition.route();
        if !route.permits(user.access_level) {
            tracing::warn!(
                "{}:{} with access '{}' can't use payload '{}'",
                messenger,
                id,
                user.access_level,
                decoded.definition.path()
            );
            return Ok(self
                .error
                .to_stage
                .call(id, messenger, MessageContent::Payload(decoded.full))
                .await);
        }

        tracing::debug!(
            "{}:{} at '{}' pressed '{}', calling '{}'",
            messenger,
            id,
            user.stage,
            decoded.definition.path(),
            decoded.dst().name()
        );
        let replies = decoded
            .dst()
            .call(id, messenger, MessageContent::Payload(decoded.full.clone()))
            .await;
        route.apply(id, messenger, stages, access).await?;
        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::payloads::Payloads;
    use crate::domain::reply::Reply;
    use crate::domain::traits::page_fn;
    use crate::domain::types::{FileAttachment, PayloadBudget, to_callback_data};
    use crate::payload;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with "<page>|<what it received>".
    fn echo(name: &'static str) -> Handler {
        page_fn(name, move |id, messenger, message| async move {
            let received = match message {
                MessageContent::Text(text) => text,
                MessageContent::Payload(map) => to_callback_data(&map),
                MessageContent::File { files, .. } => format!("{} file(s)", files.len()),
            };
            Replies::from(Reply::new(id, messenger, format!("{name}|{received}")))
        })
    }

    fn first_text(replies: &Replies) -> &str {
        replies.iter().next().map(|r| r.text.as_str()).unwrap_or("")
    }

    #[derive(Default)]
    struct Recorder {
        stage: Mutex<Option<String>>,
        access: Mutex<Option<String>>,
    }

    #[async_trait]
    impl StageStore for Recorder {
        async fn stage(&self, _: UserId, _: &Messenger) -> anyhow::Result<String> {
            Ok(self.stage.lock().unwrap().clone().unwrap_or_else(|| "start".into()))
        }

        async fn set_stage(&self, to_stage: &str, _: UserId, _: &Messenger) -> anyhow::Result<()> {
            *self.stage.lock().unwrap() = Some(to_stage.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl AccessStore for Recorder {
        async fn access_level(&self, _: UserId, _: &Messenger) -> anyhow::Result<String> {
            Ok(self.access.lock().unwrap().clone().unwrap_or_else(|| "user".into()))
        }

        async fn set_access_level(&self, level: &str, _: UserId, _: &Messenger) -> anyhow::Result<()> {
            *self.access.lock().unwrap() = Some(level.to_string());
            Ok(())
        }
    }

    fn router(payloads: Option<CompiledPayloads>) -> Router {
        let mut transitions = Transitions::new();
        transitions
            .add_transition(
                Some("start"),
                "start",
                echo("first"),
                Route::new().with_stage_id("first"),
            )
            .unwrap();
        transitions
            .add_transition(
                Some("start"),
                "first",
                echo("second"),
                Route::new().with_stage_id("second").with_access(["user", "admin"]),
            )
            .unwrap();
        transitions
            .add_transition(
                Some("admin"),
                "fourth",
                echo("admin"),
                Route::new().with_access(["admin"]).with_access_level("user"),
            )
            .unwrap();
        transitions
            .add_transition(None, "fourth", echo("fourth"), Route::default())
            .unwrap();
        transitions
            .add_transition(Some("help"), ANY, echo("help"), Route::default())
            .unwrap();
        transitions.add_error_return(echo("error")).unwrap();
        let transitions = match payloads {
            Some(payloads) => transitions.with_payloads(payloads),
            None => transitions,
        };
        transitions.compile().unwrap()
    }

    fn payloads() -> CompiledPayloads {
        let mut payloads = Payloads::new(PayloadBudget::TELEGRAM);
        payloads.add_rules(&["go", "to", "third", "page"]).unwrap();
        payloads
            .add_payload(
                "type:default/action:go_to_third_page/data:/plus:",
                "second",
                echo("third"),
                Route::new().with_stage_id("third"),
            )
            .unwrap();
        payloads
            .add_payload(
                "type:secret/id:",
                ANY,
                echo("secret"),
                Route::new().with_access(["admin"]),
            )
            .unwrap();
        payloads
            .add_error_payload("type:error_input", echo("error_payload"))
            .unwrap();
        payloads.compile().unwrap()
    }

    fn user<'a>(messenger: &'a Messenger, stage: &'a str, access_level: &'a str) -> UserContext<'a> {
        UserContext {
            user_messenger_id: 42,
            user_messenger: messenger,
            stage,
            access_level,
        }
    }

    fn text(value: &str) -> MessageContent {
        MessageContent::Text(value.to_string())
    }

    #[test]
    fn compile_requires_error_return_and_transitions() {
        let mut transitions = Transitions::new();
        transitions
            .add_transition(Some("hi"), "start", echo("first"), Route::default())
            .unwrap();
        assert_eq!(transitions.compile().err(), Some(BuildError::MissingErrorHandler));

        let mut transitions = Transitions::new();
        transitions.add_error_return(echo("error")).unwrap();
        assert!(matches!(transitions.compile(), Err(BuildError::NoTransitions)));
    }

    #[test]
    fn registration_errors() {
        let mut transitions = Transitions::new();
        transitions
            .add_transition(Some("next"), "first", echo("second"), Route::default())
            .unwrap();
        transitions
            .add_transition(None, "first", echo("first"), Route::default())
            .unwrap();

        assert!(matches!(
            transitions.add_transition(Some("NEXT"), "first", echo("other"), Route::default()),
            Err(BuildError::DuplicateTransition(_))
        ));
        assert_eq!(
            transitions.add_transition(None, "first", echo("other"), Route::default()),
            Err(BuildError::MultipleDefaults("first".into()))
        );
        assert_eq!(
            transitions.add_transition(None, ANY, echo("other"), Route::default()),
            Err(BuildError::WildcardDefault)
        );
        transitions.add_error_return(echo("error")).unwrap();
        assert_eq!(
            transitions.add_error_return(echo("error")),
            Err(BuildError::DuplicateErrorHandler)
        );
    }

    #[test]
    fn same_page_by_text_and_default_is_rejected() {
        let mut transitions = Transitions::new();
        transitions
            .add_transition(Some("next"), "first", echo("second"), Route::default())
            .unwrap();
        assert_eq!(
            transitions.add_transition(None, "first", echo("second"), Route::default()),
            Err(BuildError::RealizedByOtherTrigger {
                from_stage: "first".into(),
                to_stage: "second".into()
            })
        );

        let mut transitions = Transitions::new();
        transitions
            .add_transition(None, "first", echo("second"), Route::default())
            .unwrap();
        assert!(matches!(
            transitions.add_transition(Some("next"), "first", echo("second"), Route::default()),
            Err(BuildError::RealizedByOtherTrigger { .. })
        ));
    }

    #[test]
    fn every_stage_gets_one_default() {
        let router = router(Some(payloads()));
        let stages: Vec<&str> = router.stages().collect();
        assert_eq!(stages, vec!["first", "fourth", "second", "start", "third"]);

        for stage in &stages {
            let default = router.default_for(stage).unwrap();
            assert!(default.trigger().is_none());
            assert_eq!(default.from_stage(), *stage);
        }
        assert_eq!(router.default_for("fourth").unwrap().to_stage().name(), "fourth");
        assert_eq!(router.default_for("start").unwrap().to_stage().name(), "error");
        assert_eq!(router.default_for("third").unwrap().to_stage().name(), "error");
        assert!(router.default_for(ANY).is_none());
    }

    #[test]
    fn emoji_are_stripped() {
        assert_eq!(clean_text("  Start 👋🏽 "), "Start");
        assert_eq!(clean_text("🇷🇺 hello"), "hello");
        assert_eq!(clean_text("1️⃣ one"), "1 one");
    }

    #[test]
    fn only_outer_whitespace_is_trimmed() {
        assert_eq!(clean_text("🟢 Start"), "Start");
        assert_eq!(clean_text("start \n"), "start");
        assert_eq!(clean_text("go  back"), "go  back");
    }

    #[tokio::test]
    async fn echoed_button_label_matches_trigger() {
        let router = router(None);
        let tg = Messenger::from("tg");

        let replies = router
            .run(text("🟢 Start "), &user(&tg, "start", "user"), None, None)
            .await
            .unwrap();
        assert_eq!(first_text(&replies), "first|Start");

        let replies = router
            .run(text("st art"), &user(&tg, "start", "user"), None, None)
            .await
            .unwrap();
        assert_eq!(first_text(&replies), "error|st art");
    }

    #[tokio::test]
    async fn payload_with_odd_values_reaches_error_payload_page() {
        let router = router(Some(payloads()));
        let tg = Messenger::from("tg");
        let inbound: crate::domain::types::InboundMessage = serde_json::from_str(
            r#"{"user_id":42,"messenger":"tg","payload":{"t":"d","x":true}}"#,
        )
        .unwrap();
        let message = inbound.into_message().unwrap();

        let replies = router
            .run(message.content, &user(&tg, "second", "user"), None, None)
            .await
            .unwrap();
        assert_eq!(first_text(&replies), r#"error_payload|{"type":"error_input"}"#);
    }

    #[tokio::test]
    async fn slash_start_and_start_are_distinct() {
        let router = router(None);
        let tg = Messenger::from("tg");
        let store = Recorder::default();

        let replies = router
            .run(text("/start"), &user(&tg, "start", "user"), Some(&store), Some(&store))
            .await
            .unwrap();
        assert_eq!(first_text(&replies), "error|/start");
        assert!(store.stage.lock().unwrap().is_none());

        let replies = router
            .run(text("Start 👋"), &user(&tg, "start", "user"), Some(&store), Some(&store))
            .await
            .unwrap();
        assert_eq!(first_text(&replies), "first|Start");
        assert_eq!(store.stage.lock().unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn gated_transition_falls_through_to_default() {
        let router = router(None);
        let tg = Messenger::from("tg");
        let store = Recorder::default();

        let replies = router
            .run(text("admin"), &user(&tg, "fourth", "user"), Some(&store), Some(&store))
            .await
            .unwrap();
        assert_eq!(first_text(&replies), "fourth|admin");
        assert!(store.access.lock().unwrap().is_none());

        let replies = router
            .run(text("ADMIN"), &user(&tg, "fourth", "admin"), Some(&store), Some(&store))
            .await
            .unwrap();
        assert_eq!(first_text(&replies), "admin|ADMIN");
        assert_eq!(store.access.lock().unwrap().as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn wildcard_stage_triggers_apply_everywhere() {
        let router = router(None);
        let tg = Messenger::from("tg");

        for stage in ["start", "fourth", "nowhere"] {
            let replies = router
                .run(text("help"), &user(&tg, stage, "user"), None, None)
                .await
                .unwrap();
            assert_eq!(first_text(&replies), "help|help");
        }

        let replies = router
            .run(text("hello"), &user(&tg, "nowhere", "user"), None, None)
            .await
            .unwrap();
        assert_eq!(first_text(&replies), "error|hello");
    }

    #[tokio::test]
    async fn payload_runs_handler_then_moves_stage() {
        let router = router(Some(payloads()));
        let tg = Messenger::from("tg");
        let store = Recorder::default();

        let short = payload! { "t" => "d", "a" => "g_t_t_p", "d" => 3, "p" => "x" };
        let replies = router
            .run(
                MessageContent::Payload(short),
                &user(&tg, "second", "user"),
                Some(&store),
                Some(&store),
            )
            .await
            .unwrap();
        assert_eq!(
            first_text(&replies),
            r#"third|{"type":"default","action":"go_to_third_page","data":3,"plus":"x"}"#
        );
        assert_eq!(store.stage.lock().unwrap().as_deref(), Some("third"));
    }

    #[tokio::test]
    async fn payload_from_other_stage_is_rejected() {
        let router = router(Some(payloads()));
        let tg = Messenger::from("tg");
        let store = Recorder::default();

        let short = payload! { "t" => "d", "a" => "g_t_t_p", "d" => 3, "p" => "x" };
        let replies = router
            .run(
                MessageContent::Payload(short),
                &user(&tg, "first", "user"),
                Some(&store),
                Some(&store),
            )
            .await
            .unwrap();
        assert!(first_text(&replies).starts_with("error|"));
        assert!(store.stage.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn payload_access_is_checked() {
        let router = router(Some(payloads()));
        let tg = Messenger::from("tg");
        let short = payload! { "t" => "s", "i" => 7 };

        let replies = router
            .run(MessageContent::Payload(short.clone()), &user(&tg, "first", "user"), None, None)
            .await
            .unwrap();
        assert!(first_text(&replies).starts_with("error|"));

        let replies = router
            .run(MessageContent::Payload(short), &user(&tg, "first", "admin"), None, None)
            .await
            .unwrap();
        assert_eq!(first_text(&replies), r#"secret|{"type":"secret","id":7}"#);
    }

    #[tokio::test]
    async fn unmatched_payload_reaches_error_payload_page() {
        let router = router(Some(payloads()));
        let tg = Messenger::from("tg");
        let short = payload! { "t" => "d", "a" => "nope", "d" => 3, "p" => "x" };

        let replies = router
            .run(MessageContent::Payload(short), &user(&tg, "second", "user"), None, None)
            .await
            .unwrap();
        assert_eq!(first_text(&replies), r#"error_payload|{"type":"error_input"}"#);
    }

    #[tokio::test]
    async fn payload_without_table_goes_to_error_page() {
        let router = router(None);
        let tg = Messenger::from("tg");
        let replies = router
            .run(
                MessageContent::Payload(payload! { "t" => "d" }),
                &user(&tg, "second", "user"),
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(first_text(&replies), r#"error|{"t":"d"}"#);
    }

    #[tokio::test]
    async fn files_take_the_default_edge() {
        let router = router(None);
        let tg = Messenger::from("tg");
        let files = MessageContent::File {
            caption: Some("admin".into()),
            files: vec![FileAttachment {
                name: "a.txt".into(),
                mime_type: None,
                bytes: vec![1],
            }],
        };
        let replies = router
            .run(files, &user(&tg, "fourth", "admin"), None, None)
            .await
            .unwrap();
        assert_eq!(first_text(&replies), "fourth|1 file(s)");
    }
}
