use std::fmt;

use chanserv_api::Actor;

use crate::compose::{SwapPattern, TopicKind};
use crate::error::TopicError;

/// Topic commands understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicVerb {
    Topic,
    TopicAppend,
    TopicPrepend,
    TopicSwap,
}

impl TopicVerb {
    pub const ALL: [TopicVerb; 4] = [
        TopicVerb::Topic,
        TopicVerb::TopicAppend,
        TopicVerb::TopicPrepend,
        TopicVerb::TopicSwap,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TopicVerb::Topic => "TOPIC",
            TopicVerb::TopicAppend => "TOPICAPPEND",
            TopicVerb::TopicPrepend => "TOPICPREPEND",
            TopicVerb::TopicSwap => "TOPICSWAP",
        }
    }

    /// Case-insensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.name().eq_ignore_ascii_case(name))
    }

    pub fn kind(&self) -> TopicKind {
        match self {
            TopicVerb::Topic => TopicKind::Replace,
            TopicVerb::TopicAppend => TopicKind::Append,
            TopicVerb::TopicPrepend => TopicKind::Prepend,
            TopicVerb::TopicSwap => TopicKind::SearchReplace,
        }
    }

    pub fn syntax(&self) -> &'static str {
        match self {
            TopicVerb::Topic => "TOPIC <#channel> <topic>",
            TopicVerb::TopicAppend => "TOPICAPPEND <#channel> <topic>",
            TopicVerb::TopicPrepend => "TOPICPREPEND <#channel> <topic>",
            TopicVerb::TopicSwap => "TOPICSWAP <#channel> <search>:[<replace>]",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TopicVerb::Topic => "Sets a topic on a channel.",
            TopicVerb::TopicAppend => "Appends a topic on a channel.",
            TopicVerb::TopicPrepend => "Prepends a topic on a channel.",
            TopicVerb::TopicSwap => "Swap part of the topic on a channel.",
        }
    }
}

impl fmt::Display for TopicVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split a command line into its verb and the rest.
pub fn split_verb(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim_start()),
        None => (line, ""),
    })
}

/// A single topic change request. Lives for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRequest {
    pub verb: TopicVerb,
    pub channel: String,
    /// Raw text argument: the new text, or `search:replace` for swaps.
    pub text: String,
    pub actor: Actor,
}

impl TopicRequest {
    pub fn new(
        verb: TopicVerb,
        channel: impl Into<String>,
        text: impl Into<String>,
        actor: Actor,
    ) -> Self {
        Self {
            verb,
            channel: channel.into(),
            text: text.into(),
            actor,
        }
    }

    /// Parse `<#channel> <text...>`. The text keeps its interior spaces.
    pub fn parse(verb: TopicVerb, args: &str, actor: Actor) -> Result<Self, TopicError> {
        let missing = || TopicError::MissingParams { verb };
        let (channel, text) = split_verb(args).ok_or_else(missing)?;
        if text.is_empty() {
            return Err(missing());
        }
        Ok(Self::new(verb, channel, text, actor))
    }

    pub fn kind(&self) -> TopicKind {
        self.verb.kind()
    }

    /// Argument checks that come before any lookup.
    pub fn check_syntax(&self) -> Result<(), TopicError> {
        if self.channel.is_empty() || self.text.is_empty() {
            return Err(TopicError::MissingParams { verb: self.verb });
        }
        if self.kind() == TopicKind::SearchReplace && SwapPattern::parse(&self.text).is_none() {
            return Err(TopicError::BadSyntax { verb: self.verb });
        }
        Ok(())
    }
}
