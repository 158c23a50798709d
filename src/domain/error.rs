//! # Build Errors
//!
//! Everything that can go wrong while the bot is being assembled.
//! These are raised to the integrator during setup and never reach serving.

use thiserror::Error;

/// Configuration errors raised by the `add_*` and `compile` calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("identifier must not be empty")]
    EmptyIdentifier,

    #[error("word '{0}' is already short")]
    AlreadyShort(String),

    #[error("word '{0}' is already in the rule set")]
    DuplicateRule(String),

    #[error("rules must be added before any payload; add '{0}' earlier")]
    RulesAfterPayloads(String),

    #[error("malformed payload path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("main key '{found}' is wrong, it should be '{expected}'")]
    WrongMainKey { expected: String, found: String },

    #[error("short key '{key}' is used twice in '{path}'")]
    DuplicateKey { path: String, key: String },

    #[error("'{item}' and '{other}' shorten to the same code '{short}'")]
    ShortCollision {
        item: String,
        other: String,
        short: String,
    },

    #[error(
        "payload '{path}' has {found_triggers} trigger(s) and {found_data} data key(s), \
         its classification expects {expected_triggers} and {expected_data}"
    )]
    ArityMismatch {
        path: String,
        expected_triggers: usize,
        expected_data: usize,
        found_triggers: usize,
        found_data: usize,
    },

    #[error("payload '{0}' already exists")]
    DuplicatePayload(String),

    #[error("payload '{0}' was never added")]
    UnknownPayload(String),

    #[error("payload '{path}' needs {size} bytes, the budget is {budget}")]
    BudgetExceeded {
        path: String,
        size: usize,
        budget: usize,
    },

    #[error("error payload already added")]
    DuplicateErrorPayload,

    #[error("error payload wasn't added")]
    MissingErrorPayload,

    #[error("no payloads added")]
    NoPayloads,

    #[error("transition already exists: {0}")]
    DuplicateTransition(String),

    #[error("transition '{from_stage}' -> '{to_stage}' already realized by other trigger")]
    RealizedByOtherTrigger { from_stage: String, to_stage: String },

    #[error("multiple default transitions for stage '{0}' aren't supported")]
    MultipleDefaults(String),

    #[error("a default transition can't start from the wildcard stage")]
    WildcardDefault,

    #[error("error return already added")]
    DuplicateErrorHandler,

    #[error("error return wasn't added")]
    MissingErrorHandler,

    #[error("can't compile while no transitions added")]
    NoTransitions,

    #[error("messenger '{0}' already registered")]
    DuplicateMessenger(String),

    #[error("messenger '{messenger}' reuses the replier of '{existing}'")]
    SharedReplier { messenger: String, existing: String },

    #[error("messenger '{0}' needs a positive reply rate")]
    ZeroRate(String),
}
