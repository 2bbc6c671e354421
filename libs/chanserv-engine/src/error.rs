use chanserv_api::{Fault, InvalidFlag};

use crate::command::TopicVerb;

/// Why the requester may not touch the channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Forbidden {
    #[error("{0} is closed.")]
    Closed(String),

    #[error("You are not authorized to perform this operation.")]
    NoPrivilege,
}

/// Terminal outcome of a rejected topic request.
///
/// `Display` is the message shown to the requester.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopicError {
    #[error("Insufficient parameters for {verb}.")]
    MissingParams { verb: TopicVerb },

    #[error("Invalid parameters for {verb}.")]
    BadSyntax { verb: TopicVerb },

    #[error("Channel {0} is not registered.")]
    UnregisteredChannel(String),

    #[error("{0} is currently empty.")]
    ChannelEmpty(String),

    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("The new topic is invalid or too long.")]
    InvalidTopic,

    #[error("Channel {channel} does not have {search} in its topic.")]
    SearchNotFound { channel: String, search: String },

    #[error("The new topic is invalid or too long.")]
    ResultTooLong { len: usize, max: usize },
}

impl TopicError {
    pub fn fault(&self) -> Fault {
        match self {
            TopicError::MissingParams { .. } => Fault::NeedMoreParams,
            TopicError::BadSyntax { .. }
            | TopicError::InvalidTopic
            | TopicError::SearchNotFound { .. }
            | TopicError::ResultTooLong { .. } => Fault::BadParams,
            TopicError::UnregisteredChannel(_) | TopicError::ChannelEmpty(_) => Fault::NoSuchTarget,
            TopicError::Forbidden(_) => Fault::NoPrivs,
        }
    }

    /// Syntax line to show after the message, for argument errors.
    pub fn syntax_hint(&self) -> Option<String> {
        match self {
            TopicError::MissingParams { verb } | TopicError::BadSyntax { verb } => {
                Some(format!("Syntax: {}", verb.syntax()))
            }
            _ => None,
        }
    }

    /// Short machine-friendly name, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            TopicError::MissingParams { .. } => "missing_params",
            TopicError::BadSyntax { .. } => "bad_syntax",
            TopicError::UnregisteredChannel(_) => "unregistered_channel",
            TopicError::ChannelEmpty(_) => "channel_empty",
            TopicError::Forbidden(Forbidden::Closed(_)) => "forbidden_closed",
            TopicError::Forbidden(Forbidden::NoPrivilege) => "forbidden_no_privilege",
            TopicError::InvalidTopic => "invalid_topic",
            TopicError::SearchNotFound { .. } => "search_not_found",
            TopicError::ResultTooLong { .. } => "result_too_long",
        }
    }
}

/// Startup, configuration and reload errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    #[error("access entry '{entity}': {source}")]
    InvalidFlags {
        entity: String,
        #[source]
        source: InvalidFlag,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// Context is prepended to the message of string-carrying variants.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::InvalidFlags { entity, source } => EngineError::InvalidFlags {
                entity: format!("{ctx}: {entity}"),
                source,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_follow_failure_kind() {
        let missing = TopicError::MissingParams {
            verb: TopicVerb::Topic,
        };
        assert_eq!(missing.fault(), Fault::NeedMoreParams);
        assert_eq!(
            TopicError::UnregisteredChannel("#x".into()).fault(),
            Fault::NoSuchTarget
        );
        assert_eq!(
            TopicError::Forbidden(Forbidden::NoPrivilege).fault(),
            Fault::NoPrivs
        );
        assert_eq!(
            TopicError::ResultTooLong { len: 10, max: 5 }.fault(),
            Fault::BadParams
        );
    }

    #[test]
    fn messages_name_the_context() {
        let err = TopicError::SearchNotFound {
            channel: "#help".into(),
            search: "foo".into(),
        };
        assert_eq!(err.to_string(), "Channel #help does not have foo in its topic.");
        assert_eq!(
            TopicError::from(Forbidden::Closed("#help".into())).to_string(),
            "#help is closed."
        );
    }

    #[test]
    fn syntax_hint_only_for_argument_errors() {
        let bad = TopicError::BadSyntax {
            verb: TopicVerb::TopicSwap,
        };
        assert_eq!(
            bad.syntax_hint().as_deref(),
            Some("Syntax: TOPICSWAP <#channel> <search>:[<replace>]")
        );
        assert_eq!(TopicError::InvalidTopic.syntax_hint(), None);
    }

    #[test]
    fn context_is_prepended() {
        let err = EngineError::Config("bad".into()).with_context("registration '#a'");
        assert_eq!(err.to_string(), "config error: registration '#a': bad");
    }
}
