use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::ChannelConfig;

/// Fold a channel name or nick with RFC 1459 case mapping.
///
/// ASCII letters are lowercased and `[]\~` map to `{}|^`.
pub fn fold_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '[' => '{',
            ']' => '}',
            '\\' => '|',
            '~' => '^',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// A channel live on the network.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelRecord {
    /// Name as first seen, in its original case.
    pub name: String,
    /// Current topic; empty when none is set.
    pub topic: String,
    /// Who set the current topic; empty until a topic has been set.
    pub topic_setter: String,
    /// Network timestamp of the current topic; 0 when none is set.
    pub topic_ts: i64,
    /// Folded nicks of the members.
    members: HashSet<String>,
}

impl ChannelRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_topic(&self) -> bool {
        !self.topic.is_empty()
    }

    pub fn is_member(&self, nick: &str) -> bool {
        self.members.contains(&fold_name(nick))
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn add_member(&mut self, nick: &str) -> bool {
        self.members.insert(fold_name(nick))
    }

    pub fn remove_member(&mut self, nick: &str) -> bool {
        self.members.remove(&fold_name(nick))
    }
}

impl From<&ChannelConfig> for ChannelRecord {
    fn from(cfg: &ChannelConfig) -> Self {
        let mut record = ChannelRecord::new(cfg.name.clone());
        if let Some(topic) = cfg.topic.as_ref().filter(|t| !t.is_empty()) {
            record.topic = topic.clone();
            record.topic_setter = cfg
                .topic_setter
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| chanserv_api::actor::UNKNOWN_SETTER.to_string());
            record.topic_ts = cfg.topic_ts;
        }
        for nick in &cfg.members {
            record.add_member(nick);
        }
        record
    }
}

/// Network channel state, shared with whatever applies inbound network events.
///
/// Readers get snapshots; writers go through [`ChannelRegistry::update`] so a
/// channel destroyed in the meantime is never written to.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, ChannelRecord>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ChannelRecord>> {
        match self.channels.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("channel registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ChannelRecord>> {
        match self.channels.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("channel registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Insert or replace a channel.
    pub fn insert(&self, record: ChannelRecord) {
        let key = fold_name(&record.name);
        self.write().insert(key, record);
    }

    /// Create a channel with no members yet. Returns false if it already exists.
    ///
    /// The record holds state but is not live until someone joins.
    pub fn create(&self, name: &str) -> bool {
        let mut guard = self.write();
        let key = fold_name(name);
        if guard.contains_key(&key) {
            return false;
        }
        guard.insert(key, ChannelRecord::new(name));
        tracing::debug!(channel = %name, "channel created");
        true
    }

    pub fn destroy(&self, name: &str) -> Option<ChannelRecord> {
        let removed = self.write().remove(&fold_name(name));
        if removed.is_some() {
            tracing::debug!(channel = %name, "channel destroyed");
        }
        removed
    }

    /// Add a member, creating the channel if needed.
    pub fn join(&self, name: &str, nick: &str) -> bool {
        let mut guard = self.write();
        guard
            .entry(fold_name(name))
            .or_insert_with(|| ChannelRecord::new(name))
            .add_member(nick)
    }

    /// Remove a member; the channel goes away with its last member.
    pub fn part(&self, name: &str, nick: &str) -> bool {
        let mut guard = self.write();
        let key = fold_name(name);
        let Some(record) = guard.get_mut(&key) else {
            return false;
        };
        let removed = record.remove_member(nick);
        if record.member_count() == 0 {
            guard.remove(&key);
            tracing::debug!(channel = %name, "last member left, channel destroyed");
        }
        removed
    }

    /// Install a topic received from the network as-is.
    ///
    /// Ordering against local changes is the sender's business: the
    /// remote side has already resolved it by timestamp.
    pub fn apply_remote_topic(&self, name: &str, setter: &str, ts: i64, text: &str) -> bool {
        self.update(name, |record| {
            record.topic = text.to_string();
            record.topic_setter = setter.to_string();
            record.topic_ts = ts;
        })
        .is_some()
    }

    /// Run `f` against the live record under the write lock.
    ///
    /// Returns `None` if the channel does not exist at the time of the call.
    pub fn update<R>(&self, name: &str, f: impl FnOnce(&mut ChannelRecord) -> R) -> Option<R> {
        let mut guard = self.write();
        guard.get_mut(&fold_name(name)).map(f)
    }

    pub fn get(&self, name: &str) -> Option<ChannelRecord> {
        self.read().get(&fold_name(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(&fold_name(name))
    }

    /// True when the channel exists and has at least one member.
    pub fn is_live(&self, name: &str) -> bool {
        self.read()
            .get(&fold_name(name))
            .is_some_and(|record| record.member_count() > 0)
    }

    pub fn is_member(&self, name: &str, nick: &str) -> bool {
        self.read()
            .get(&fold_name(name))
            .is_some_and(|record| record.is_member(nick))
    }

    pub fn names(&self) -> Vec<String> {
        self.read().values().map(|r| r.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
