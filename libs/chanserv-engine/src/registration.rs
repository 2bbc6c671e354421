use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chanserv_api::{AccessFlags, Actor};

use crate::channel::fold_name;
use crate::config::RegistrationConfig;
use crate::error::EngineError;

/// Staff closure of a registered channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedBy {
    pub closer: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEntry {
    /// Account name or nick.
    pub entity: String,
    pub flags: AccessFlags,
}

/// A channel's registration with services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub name: String,
    pub closed: Option<ClosedBy>,
    pub access: Vec<AccessEntry>,
}

impl RegistrationRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            closed: None,
            access: Vec::new(),
        }
    }

    pub fn with_access(mut self, entity: impl Into<String>, flags: AccessFlags) -> Self {
        self.access.push(AccessEntry {
            entity: entity.into(),
            flags,
        });
        self
    }

    pub fn closed_by(mut self, closer: impl Into<String>, reason: impl Into<String>) -> Self {
        self.closed = Some(ClosedBy {
            closer: closer.into(),
            reason: reason.into(),
        });
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_some()
    }

    /// Union of the flags of every entry matching the actor.
    pub fn flags_for(&self, actor: &Actor) -> AccessFlags {
        let Some(identity) = actor.identity() else {
            return AccessFlags::empty();
        };
        let identity = fold_name(identity);
        self.access
            .iter()
            .filter(|entry| fold_name(&entry.entity) == identity)
            .fold(AccessFlags::empty(), |acc, entry| acc | entry.flags)
    }

    pub fn has_capability(&self, actor: &Actor, capability: AccessFlags) -> bool {
        self.flags_for(actor).contains(capability)
    }
}

impl TryFrom<&RegistrationConfig> for RegistrationRecord {
    type Error = EngineError;

    fn try_from(cfg: &RegistrationConfig) -> Result<Self, Self::Error> {
        let access = cfg
            .access
            .iter()
            .map(|entry| {
                Ok(AccessEntry {
                    entity: entry.entity.clone(),
                    flags: entry.parse_flags()?,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        Ok(Self {
            name: cfg.name.clone(),
            closed: cfg.closed.as_ref().map(|c| ClosedBy {
                closer: c.closer.clone(),
                reason: c.reason.clone(),
            }),
            access,
        })
    }
}

/// Registered channels, keyed by folded name. Read-only to the topic
/// pipeline; replaced wholesale on configuration reload.
#[derive(Debug, Default)]
pub struct RegistrationStore {
    records: RwLock<HashMap<String, Arc<RegistrationRecord>>>,
}

impl RegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(configs: &[RegistrationConfig]) -> Result<Self, EngineError> {
        let store = Self::new();
        store.replace_all(build_records(configs)?);
        Ok(store)
    }

    pub fn register(&self, record: RegistrationRecord) {
        let key = fold_name(&record.name);
        let mut guard = match self.records.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("registration store write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.insert(key, Arc::new(record));
    }

    pub fn find(&self, name: &str) -> Option<Arc<RegistrationRecord>> {
        let guard = match self.records.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("registration store read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.get(&fold_name(name)).cloned()
    }

    /// Swap in a new set of registrations.
    pub fn replace_all(&self, records: Vec<RegistrationRecord>) {
        let map = records
            .into_iter()
            .map(|r| (fold_name(&r.name), Arc::new(r)))
            .collect();
        let mut guard = match self.records.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("registration store write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        *guard = map;
    }

    pub fn len(&self) -> usize {
        match self.records.read() {
            Ok(g) => g.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn build_records(
    configs: &[RegistrationConfig],
) -> Result<Vec<RegistrationRecord>, EngineError> {
    configs
        .iter()
        .map(|cfg| {
            RegistrationRecord::try_from(cfg)
                .map_err(|e| e.with_context(format!("registration '{}'", cfg.name)))
        })
        .collect()
}
