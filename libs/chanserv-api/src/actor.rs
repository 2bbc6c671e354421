use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Literal used as setter identity when the requester cannot be named.
pub const UNKNOWN_SETTER: &str = "unknown";

/// The entity issuing a command.
///
/// A live network session is identified by its nickname, an authenticated
/// account by its account name. The two are mutually exclusive here: a
/// request arrives either through a session or on behalf of an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Actor {
    Session(String),
    Account(String),
    Unknown,
}

impl Actor {
    pub fn session(nick: impl Into<String>) -> Self {
        Actor::Session(nick.into())
    }

    pub fn account(name: impl Into<String>) -> Self {
        Actor::Account(name.into())
    }

    /// Nickname of the live session, if the actor has one.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Actor::Session(nick) => Some(nick),
            _ => None,
        }
    }

    /// Name matched against channel access lists.
    pub fn identity(&self) -> Option<&str> {
        match self {
            Actor::Session(name) | Actor::Account(name) => Some(name),
            Actor::Unknown => None,
        }
    }

    /// Identity recorded as the topic setter: nick, else account, else `unknown`.
    pub fn setter(&self) -> &str {
        self.identity().unwrap_or(UNKNOWN_SETTER)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Session(nick) => write!(f, "nick:{nick}"),
            Actor::Account(name) => write!(f, "account:{name}"),
            Actor::Unknown => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid actor '{0}': expected nick:<name>, account:<name> or -")]
pub struct ParseActorError(pub String);

impl FromStr for Actor {
    type Err = ParseActorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Actor::Unknown);
        }
        let (kind, name) = s
            .split_once(':')
            .ok_or_else(|| ParseActorError(s.to_string()))?;
        if name.is_empty() {
            return Err(ParseActorError(s.to_string()));
        }
        match kind {
            "nick" => Ok(Actor::session(name)),
            "account" => Ok(Actor::account(name)),
            _ => Err(ParseActorError(s.to_string())),
        }
    }
}
