//! Topic text composition.
//!
//! Every strategy computes the final length first, checks it against the
//! bound, and only then builds the new string. Over-long results are
//! rejected, never truncated.

use crate::command::TopicVerb;
use crate::error::TopicError;

/// Joins old and new topic parts for append and prepend.
pub const TOPIC_SEPARATOR: &str = " | ";

/// How the new topic is derived from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    Replace,
    Append,
    Prepend,
    SearchReplace,
}

/// `search:replace` argument, split at the rightmost colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPattern<'a> {
    pub search: &'a str,
    pub replace: &'a str,
}

impl<'a> SwapPattern<'a> {
    /// `None` when there is no colon or the search part would be empty.
    pub fn parse(arg: &'a str) -> Option<Self> {
        let pos = arg.rfind(':')?;
        if pos == 0 {
            return None;
        }
        Some(Self {
            search: &arg[..pos],
            replace: &arg[pos + 1..],
        })
    }
}

/// Produce the candidate topic for `kind`.
///
/// `current` is empty when the channel has no topic. `channel` is only
/// used to name the channel in errors.
pub fn compose(
    current: &str,
    kind: TopicKind,
    arg: &str,
    channel: &str,
    max_len: usize,
) -> Result<String, TopicError> {
    match kind {
        TopicKind::Replace => Ok(arg.to_string()),
        TopicKind::Append if current.is_empty() => Ok(arg.to_string()),
        TopicKind::Append => join(current, arg, max_len),
        TopicKind::Prepend if current.is_empty() => Ok(arg.to_string()),
        TopicKind::Prepend => join(arg, current, max_len),
        TopicKind::SearchReplace => {
            let pattern = SwapPattern::parse(arg).ok_or(TopicError::BadSyntax {
                verb: TopicVerb::TopicSwap,
            })?;
            swap(current, pattern, channel, max_len)
        }
    }
}

fn join(head: &str, tail: &str, max_len: usize) -> Result<String, TopicError> {
    let len = head.len() + TOPIC_SEPARATOR.len() + tail.len();
    check_len(len, max_len)?;
    let mut out = String::with_capacity(len);
    out.push_str(head);
    out.push_str(TOPIC_SEPARATOR);
    out.push_str(tail);
    Ok(out)
}

fn swap(
    current: &str,
    pattern: SwapPattern<'_>,
    channel: &str,
    max_len: usize,
) -> Result<String, TopicError> {
    let start = current
        .find(pattern.search)
        .ok_or_else(|| TopicError::SearchNotFound {
            channel: channel.to_string(),
            search: pattern.search.to_string(),
        })?;
    let end = start + pattern.search.len();

    let len = current.len() - pattern.search.len() + pattern.replace.len();
    check_len(len, max_len)?;

    let mut out = String::with_capacity(len);
    out.push_str(&current[..start]);
    out.push_str(pattern.replace);
    out.push_str(&current[end..]);
    Ok(out)
}

fn check_len(len: usize, max: usize) -> Result<(), TopicError> {
    if len > max {
        return Err(TopicError::ResultTooLong { len, max });
    }
    Ok(())
}
