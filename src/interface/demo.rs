//! # Demo Wiring
//!
//! Assembles the tour shipped with the binary: payloads, transitions and the
//! reply division with a console replier per configured messenger.

use std::sync::Arc;

use crate::application::division::{Dispatcher, ReplyDivision};
use crate::application::payloads::{CompiledPayloads, Payloads};
use crate::application::route::Route;
use crate::application::transitions::{Router, Transitions};
use crate::domain::config::AppConfig;
use crate::domain::error::BuildError;
use crate::domain::traits::{Handler, page_fn};
use crate::domain::types::{ANY, Messenger};
use crate::infrastructure::console::ConsoleReplier;
use crate::interface::pages::{self, ErrorPage};

pub mod stages {
    pub const START: &str = "start";
    pub const FIRST: &str = "first";
    pub const SECOND: &str = "second";
    pub const THIRD: &str = "third";
    pub const FOURTH: &str = "fourth";
    pub const FIFTH: &str = "fifth";
}

/// Messengers served when the configuration lists none.
const DEFAULT_MESSENGERS: [(&str, u32); 2] = [("tg", 30), ("vk", 20)];

struct DemoPages {
    first: Handler,
    second: Handler,
    third_before: Handler,
    third_after: Handler,
    fourth: Handler,
    fourth_admin: Handler,
    fifth: Handler,
    files: Handler,
    error: Handler,
}

impl DemoPages {
    fn new(config: &AppConfig) -> Self {
        let limits = config.keyboard;
        Self {
            first: page_fn("first", move |id, m, msg| pages::first_page(limits, id, m, msg)),
            second: page_fn("second", move |id, m, msg| pages::second_page(limits, id, m, msg)),
            third_before: page_fn("third_before", move |id, m, msg| {
                pages::third_before_page(limits, id, m, msg)
            }),
            third_after: page_fn("third_after", move |id, m, msg| {
                pages::third_after_page(limits, id, m, msg)
            }),
            fourth: page_fn("fourth", move |id, m, msg| pages::fourth_page(limits, id, m, msg)),
            fourth_admin: page_fn("fourth_admin", move |id, m, msg| {
                pages::fourth_admin_page(limits, id, m, msg)
            }),
            fifth: page_fn("fifth", move |id, m, msg| pages::fifth_page(limits, id, m, msg)),
            files: page_fn("files", pages::files_page),
            error: Arc::new(ErrorPage),
        }
    }
}

fn build_payloads(config: &AppConfig, pages: &DemoPages) -> Result<CompiledPayloads, BuildError> {
    let budget = config.payload_budget();
    let mut payloads = if config.payloads.shorten {
        Payloads::new(budget)
    } else {
        Payloads::without_shortening(budget)
    };

    payloads.add_rules(&["go", "to", "third", "page"])?;
    payloads.add_error_payload("type:error_input", pages.error.clone())?;

    payloads.add_payload(
        "type:data/action:go_to_third_page/data:/id:",
        stages::SECOND,
        pages.third_before.clone(),
        Route::new().with_stage_id(stages::THIRD),
    )?;
    // placeholder, retracted below
    payloads.add_payload(
        "type:fake/id:",
        stages::SECOND,
        pages.third_before.clone(),
        Route::new().with_stage_id(stages::THIRD),
    )?;
    payloads.add_payload(
        "type:transition/action:go_to_third_after_page",
        stages::THIRD,
        pages.third_after.clone(),
        Route::default(),
    )?;

    payloads.apply_rules();

    payloads.add_payload(
        "type:transition/action:go_to_fourth_page",
        stages::THIRD,
        pages.fourth.clone(),
        Route::new().with_stage_id(stages::FOURTH),
    )?;
    payloads.remove_payload("type:fake/id:")?;

    payloads.compile()
}

/// Builds the routing table of the tour.
pub fn build_router(config: &AppConfig) -> Result<Router, BuildError> {
    let pages = DemoPages::new(config);
    let payloads = build_payloads(config, &pages)?;
    let mut transitions = Transitions::new();

    transitions.add_error_return(pages.error.clone())?;

    for trigger in ["/start", "начать"] {
        transitions.add_transition(
            Some(trigger),
            stages::START,
            pages.first.clone(),
            Route::new().with_stage_id(stages::FIRST),
        )?;
    }
    transitions.add_transition(
        Some("start"),
        stages::FIRST,
        pages.second.clone(),
        Route::new()
            .with_stage_id(stages::SECOND)
            .with_access(["user", "admin"]),
    )?;

    transitions.add_transition(
        Some("go to previous"),
        stages::THIRD,
        pages.second.clone(),
        Route::new().with_stage_id(stages::SECOND),
    )?;
    transitions.add_transition(
        Some("go to beginning"),
        stages::THIRD,
        pages.first.clone(),
        Route::new().with_stage_id(stages::FIRST),
    )?;
    transitions.add_transition(
        Some("go to next"),
        stages::THIRD,
        pages.fourth.clone(),
        Route::new().with_stage_id(stages::FOURTH).with_access("user"),
    )?;

    transitions.add_transition(
        Some("admin"),
        stages::FOURTH,
        pages.fourth_admin.clone(),
        Route::new().with_access_level("admin"),
    )?;
    transitions.add_transition(
        Some("next"),
        stages::FOURTH,
        pages.fifth.clone(),
        Route::new().with_stage_id(stages::FIFTH).with_access("admin"),
    )?;
    transitions.add_transition(
        Some("go back"),
        stages::FOURTH,
        pages.third_after.clone(),
        Route::new().with_stage_id(stages::THIRD),
    )?;

    transitions.add_transition(
        Some("go to beginning"),
        stages::FIFTH,
        pages.first.clone(),
        Route::new().with_stage_id(stages::FIRST),
    )?;
    transitions.add_transition(
        Some("user"),
        stages::FIFTH,
        pages.first.clone(),
        Route::new()
            .with_stage_id(stages::FIRST)
            .with_access_level("user"),
    )?;
    transitions.add_transition(None, stages::FIFTH, pages.files.clone(), Route::default())?;

    transitions.add_transition(
        Some("/restart"),
        ANY,
        pages.first.clone(),
        Route::new().with_stage_id(stages::FIRST),
    )?;

    transitions.with_payloads(payloads).compile()
}

/// Registers a console replier for every configured messenger.
pub fn build_dispatcher(config: &AppConfig) -> Result<Dispatcher, BuildError> {
    let mut division = ReplyDivision::new();
    if config.messengers.is_empty() {
        for (name, rate) in DEFAULT_MESSENGERS {
            division.register_messenger(Messenger::from(name), Arc::new(ConsoleReplier::new()), rate)?;
        }
    }
    for messenger in &config.messengers {
        division.register_messenger(
            Messenger::new(messenger.name.as_str()),
            Arc::new(ConsoleReplier::new()),
            messenger.messages_per_second,
        )?;
    }
    Ok(division.compile())
}
