use std::sync::Mutex;

use chanserv_api::{Actor, AuditLog};

/// Writes performed actions to the `chanserv::audit` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl AuditLog for TracingAudit {
    fn log_action(&self, actor: &Actor, verb: &str, channel: &str) {
        tracing::info!(target: "chanserv::audit", actor = %actor, verb, channel, "command performed");
    }
}

/// One audited action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub actor: Actor,
    pub verb: String,
    pub channel: String,
}

/// Keeps audited actions in memory.
#[derive(Debug, Default)]
pub struct RecordingAudit {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        match self.entries.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditLog for RecordingAudit {
    fn log_action(&self, actor: &Actor, verb: &str, channel: &str) {
        let entry = AuditEntry {
            actor: actor.clone(),
            verb: verb.to_string(),
            channel: channel.to_string(),
        };
        match self.entries.lock() {
            Ok(mut g) => g.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}
