use std::sync::Arc;

use chanserv_api::{AuditLog, Clock, UpstreamLink};

use crate::channel::{ChannelRecord, ChannelRegistry};
use crate::config::{ConfigParser, ServiceConfig};
use crate::error::EngineError;
use crate::registration::{build_records, RegistrationStore};
use crate::service::TopicService;

/// The running service: topic pipeline plus the configuration it was built from.
pub struct Engine {
    service: TopicService,
    config: ServiceConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("service", &self.service)
            .field("config", &self.config)
            .finish()
    }
}

impl Engine {
    /// Bootstrap the engine from a parsed configuration.
    ///
    /// Loads registrations and seeds the live channel state.
    pub fn bootstrap(
        config: ServiceConfig,
        uplink: Arc<dyn UpstreamLink>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        // --- 1. Registrations ---
        let registrations = Arc::new(RegistrationStore::from_config(&config.registrations)?);
        tracing::info!(count = registrations.len(), "loaded registrations");

        // --- 2. Live channels ---
        let channels = Arc::new(ChannelRegistry::new());
        for chan_cfg in &config.channels {
            let record = ChannelRecord::from(chan_cfg);
            tracing::info!(
                channel = %record.name,
                members = record.member_count(),
                has_topic = record.has_topic(),
                "seeded channel"
            );
            channels.insert(record);
        }

        let service = TopicService::new(
            channels,
            registrations,
            config.limits.into(),
            uplink,
            audit,
            clock,
        );

        Ok(Engine { service, config })
    }

    pub fn service(&self) -> &TopicService {
        &self.service
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Reload configuration (SIGHUP).
    ///
    /// 1. Service identity and uplink settings → unchanged, or error (restart needed).
    /// 2. Registrations → rebuilt and swapped in as a whole.
    /// 3. Limits → applied to subsequent requests.
    /// 4. Channel seeds → ignored; live channels belong to the network.
    ///
    /// Nothing is applied unless the whole new configuration is valid.
    pub fn reload(&mut self, new_config: ServiceConfig) -> Result<(), EngineError> {
        new_config.validate()?;
        let old_config = &self.config;

        if old_config.service_nick != new_config.service_nick
            || old_config.server_name != new_config.server_name
        {
            return Err(EngineError::Config(
                "service_nick and server_name cannot be changed at runtime (requires restart)"
                    .to_string(),
            ));
        }
        if old_config.uplink != new_config.uplink {
            return Err(EngineError::Config(
                "uplink settings cannot be changed at runtime (requires restart)".to_string(),
            ));
        }

        // --- Registrations ---
        let records = build_records(&new_config.registrations)?;
        for old in &old_config.registrations {
            if !new_config.registrations.iter().any(|r| r.name == old.name) {
                tracing::info!(channel = %old.name, "registration removed (reload)");
            }
        }
        for new in &new_config.registrations {
            match old_config.registrations.iter().find(|r| r.name == new.name) {
                None => tracing::info!(channel = %new.name, "registration added (reload)"),
                Some(old) if old != new => {
                    tracing::info!(channel = %new.name, "registration changed (reload)")
                }
                Some(_) => {}
            }
        }
        self.service.registrations().replace_all(records);

        // --- Limits ---
        if old_config.limits != new_config.limits {
            tracing::info!(
                max_topic_len = new_config.limits.max_topic_len,
                allow_formatting = new_config.limits.allow_formatting,
                "topic limits changed (reload)"
            );
            self.service.set_validator(new_config.limits.into());
        }

        // --- Channels ---
        if old_config.channels != new_config.channels {
            tracing::warn!("channel seeds changed; live channels are left as they are");
        }

        self.config = new_config;
        tracing::info!("config reload complete");
        Ok(())
    }

    /// Reload configuration from a file path.
    pub fn reload_from_file(
        &mut self,
        path: &str,
        parsers: &[&dyn ConfigParser],
    ) -> Result<(), EngineError> {
        let new_config = ServiceConfig::load_with(path, parsers)?;
        self.reload(new_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RecordingAudit;
    use crate::sync::RecordingUplink;
    use chanserv_api::{Actor, ManualClock};

    const BASE: &str = r##"
[limits]
max_topic_len = 100

[[registrations]]
name = "#help"
[[registrations.access]]
entity = "alice"
flags = "+t"

[[channels]]
name = "#help"
topic = "Welcome"
topic_ts = 10
members = ["bob"]
"##;

    fn engine(config: &str) -> Engine {
        Engine::bootstrap(
            ServiceConfig::parse(config).unwrap(),
            Arc::new(RecordingUplink::new()),
            Arc::new(RecordingAudit::new()),
            Arc::new(ManualClock::new(100)),
        )
        .unwrap()
    }

    #[test]
    fn bootstrap_seeds_registrations_and_channels() {
        let engine = engine(BASE);
        let service = engine.service();
        assert!(service.registrations().find("#help").is_some());
        let record = service.channels().get("#help").unwrap();
        assert_eq!(record.topic, "Welcome");
        assert!(record.is_member("bob"));
        assert_eq!(service.validator().max_len(), 100);
    }

    #[test]
    fn reload_swaps_registrations_and_limits() {
        let mut engine = engine(BASE);
        let new = ServiceConfig::parse(
            r##"
[limits]
max_topic_len = 20

[[registrations]]
name = "#help"
[[registrations.access]]
entity = "bob"
flags = "+t"
"##,
        )
        .unwrap();
        engine.reload(new).unwrap();

        let service = engine.service();
        let reg = service.registrations().find("#help").unwrap();
        assert!(!reg.has_capability(&Actor::session("alice"), crate::gate::CAPABILITY_TOPIC));
        assert!(reg.has_capability(&Actor::session("bob"), crate::gate::CAPABILITY_TOPIC));
        assert_eq!(service.validator().max_len(), 20);
        // Live channel state survives reload.
        assert_eq!(service.channels().get("#help").unwrap().topic, "Welcome");
    }

    #[test]
    fn reload_refuses_identity_change_and_keeps_old_state() {
        let mut engine = engine(BASE);
        let new = ServiceConfig::parse(&format!("service_nick = \"OtherServ\"\n{BASE}")).unwrap();
        assert!(matches!(engine.reload(new), Err(EngineError::Config(_))));
        assert_eq!(engine.config().service_nick, "ChanServ");
    }

    #[test]
    fn invalid_reload_applies_nothing() {
        let mut engine = engine(BASE);
        let new = ServiceConfig::parse(
            r##"
[[registrations]]
name = "#new"
[[registrations.access]]
entity = "alice"
flags = "+?"
"##,
        )
        .unwrap();
        assert!(engine.reload(new).is_err());
        assert!(engine.service().registrations().find("#help").is_some());
        assert!(engine.service().registrations().find("#new").is_none());
    }
}
