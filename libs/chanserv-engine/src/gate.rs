//! Authorization gate.
//!
//! Registration and liveness are always checked first. The relative order of
//! the closed-channel and privilege checks depends on the strategy: plain
//! TOPIC reports a closed channel before a missing privilege, the composing
//! strategies do the opposite. Both orders reject the same requests; only the
//! message the requester sees differs.

use chanserv_api::{AccessFlags, Actor};

use crate::channel::ChannelRegistry;
use crate::compose::TopicKind;
use crate::error::{Forbidden, TopicError};
use crate::registration::RegistrationStore;

/// Capability required to change a channel's topic.
pub const CAPABILITY_TOPIC: AccessFlags = AccessFlags::TOPIC;

/// Which of the two policy checks runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOrder {
    ClosedFirst,
    PrivilegeFirst,
}

impl TopicKind {
    pub fn gate_order(self) -> GateOrder {
        match self {
            TopicKind::Replace => GateOrder::ClosedFirst,
            TopicKind::Append | TopicKind::Prepend | TopicKind::SearchReplace => {
                GateOrder::PrivilegeFirst
            }
        }
    }
}

/// Confirm `actor` may change the topic of `channel`. No side effects.
pub fn authorize(
    registrations: &RegistrationStore,
    channels: &ChannelRegistry,
    actor: &Actor,
    channel: &str,
    order: GateOrder,
) -> Result<(), TopicError> {
    let registration = registrations
        .find(channel)
        .ok_or_else(|| TopicError::UnregisteredChannel(channel.to_string()))?;

    if !channels.is_live(channel) {
        return Err(TopicError::ChannelEmpty(channel.to_string()));
    }

    let closed = || {
        if registration.is_closed() {
            Err(Forbidden::Closed(channel.to_string()))
        } else {
            Ok(())
        }
    };
    let privileged = || {
        if registration.has_capability(actor, CAPABILITY_TOPIC) {
            Ok(())
        } else {
            Err(Forbidden::NoPrivilege)
        }
    };

    match order {
        GateOrder::ClosedFirst => closed().and_then(|()| privileged())?,
        GateOrder::PrivilegeFirst => privileged().and_then(|()| closed())?,
    }
    Ok(())
}
