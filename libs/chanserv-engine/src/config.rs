use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use chanserv_api::AccessFlags;

use crate::channel::fold_name;
use crate::error::EngineError;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Nick the service speaks as on the network.
    #[serde(default = "default_service_nick")]
    pub service_nick: String,

    /// Server name of the services link.
    #[serde(default = "default_server_name")]
    pub server_name: String,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub uplink: UplinkConfig,

    /// Registered channels.
    #[serde(default)]
    pub registrations: Vec<RegistrationConfig>,

    /// Channels live on the network at startup.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

fn default_service_nick() -> String {
    "ChanServ".to_string()
}

fn default_server_name() -> String {
    "services.int".to_string()
}

/// Topic text limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LimitsConfig {
    /// Maximum topic length in bytes.
    #[serde(default = "default_max_topic_len")]
    pub max_topic_len: usize,

    /// Whether mIRC formatting codes are allowed in topics.
    #[serde(default = "default_allow_formatting")]
    pub allow_formatting: bool,
}

fn default_max_topic_len() -> usize {
    390
}

fn default_allow_formatting() -> bool {
    true
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_topic_len: default_max_topic_len(),
            allow_formatting: default_allow_formatting(),
        }
    }
}

/// What the uplink does when its outbound queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the line and log it.
    Drop,
    /// Wait for room. Requires a multi-threaded runtime when called from async code.
    #[serde(alias = "backpressure")]
    BackPressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UplinkConfig {
    /// Outbound queue size, in lines.
    #[serde(default = "default_uplink_buffer")]
    pub buffer: usize,

    #[serde(default = "default_uplink_overflow")]
    pub overflow: OverflowPolicy,
}

fn default_uplink_buffer() -> usize {
    1024
}

fn default_uplink_overflow() -> OverflowPolicy {
    OverflowPolicy::Drop
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            buffer: default_uplink_buffer(),
            overflow: default_uplink_overflow(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrationConfig {
    pub name: String,
    /// Present when the channel has been closed by staff.
    #[serde(default)]
    pub closed: Option<ClosedConfig>,
    #[serde(default)]
    pub access: Vec<AccessConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClosedConfig {
    pub closer: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessConfig {
    /// Account name or nick the entry applies to.
    pub entity: String,
    /// Flag string, e.g. `+Aiotv`.
    pub flags: String,
}

impl AccessConfig {
    pub fn parse_flags(&self) -> Result<AccessFlags, EngineError> {
        self.flags
            .parse()
            .map_err(|source| EngineError::InvalidFlags {
                entity: self.entity.clone(),
                source,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub topic_setter: Option<String>,
    #[serde(default)]
    pub topic_ts: i64,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Pluggable configuration front-end, selected by file extension.
pub trait ConfigParser: Send + Sync {
    fn extensions(&self) -> &[&str];

    fn parse(&self, content: &str) -> Result<ServiceConfig, EngineError>;
}

/// Built-in TOML front-end.
pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, content: &str) -> Result<ServiceConfig, EngineError> {
        ServiceConfig::parse(content)
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        Self::load_with(path, &[&TomlParser])
    }

    /// Load configuration, choosing the parser by file extension.
    pub fn load_with(path: &str, parsers: &[&dyn ConfigParser]) -> Result<Self, EngineError> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let parser = parsers
            .iter()
            .find(|p| p.extensions().contains(&ext))
            .ok_or_else(|| {
                EngineError::Config(format!("{path}: no parser for extension '{ext}'"))
            })?;
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        let config = parser.parse(&content).map_err(|e| e.with_context(path))?;
        config.validate().map_err(|e| e.with_context(path))?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.service_nick.is_empty() || self.server_name.is_empty() {
            return Err(EngineError::Config(
                "service_nick and server_name must not be empty".to_string(),
            ));
        }
        if self.limits.max_topic_len == 0 {
            return Err(EngineError::Config("limits.max_topic_len must be > 0".to_string()));
        }
        if self.uplink.buffer == 0 {
            return Err(EngineError::Config("uplink.buffer must be > 0".to_string()));
        }

        let mut seen = HashSet::new();
        for reg in &self.registrations {
            let ctx = format!("registration '{}'", reg.name);
            check_channel_name(&reg.name).map_err(|e| e.with_context(&ctx))?;
            if !seen.insert(fold_name(&reg.name)) {
                return Err(EngineError::Duplicate {
                    kind: "registration",
                    name: reg.name.clone(),
                });
            }
            for entry in &reg.access {
                entry.parse_flags().map_err(|e| e.with_context(&ctx))?;
            }
        }

        let mut seen = HashSet::new();
        for chan in &self.channels {
            let ctx = format!("channel '{}'", chan.name);
            check_channel_name(&chan.name).map_err(|e| e.with_context(&ctx))?;
            if !seen.insert(fold_name(&chan.name)) {
                return Err(EngineError::Duplicate {
                    kind: "channel",
                    name: chan.name.clone(),
                });
            }
            if let Some(topic) = &chan.topic {
                if topic.len() > self.limits.max_topic_len {
                    return Err(EngineError::Config(format!(
                        "{ctx}: topic exceeds {} bytes",
                        self.limits.max_topic_len
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_channel_name(name: &str) -> Result<(), EngineError> {
    let valid_prefix = name.starts_with('#') || name.starts_with('&');
    if !valid_prefix || name.len() < 2 || name.contains([' ', ',', '\x07']) {
        return Err(EngineError::Config(format!("invalid channel name '{name}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
service_nick = "ChanServ"
server_name = "services.example.net"

[limits]
max_topic_len = 300

[uplink]
buffer = 16
overflow = "backpressure"

[[registrations]]
name = "#help"
[[registrations.access]]
entity = "alice"
flags = "+Aiotv"

[[registrations]]
name = "#closed"
[registrations.closed]
closer = "oper"
reason = "spam"

[[channels]]
name = "#help"
topic = "Welcome"
topic_setter = "alice"
topic_ts = 1700000000
members = ["alice"]
"##;

    #[test]
    fn parses_full_config() {
        let config = ServiceConfig::parse(SAMPLE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.limits.max_topic_len, 300);
        assert!(config.limits.allow_formatting);
        assert_eq!(config.uplink.overflow, OverflowPolicy::BackPressure);
        assert_eq!(config.registrations.len(), 2);
        assert_eq!(config.registrations[1].closed.as_ref().unwrap().closer, "oper");
        assert_eq!(config.channels[0].members, vec!["alice".to_string()]);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = ServiceConfig::parse("").unwrap();
        assert_eq!(config.service_nick, "ChanServ");
        assert_eq!(config.limits, LimitsConfig::default());
        assert_eq!(config.uplink, UplinkConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn rejects_duplicate_registrations_case_insensitively() {
        let config = ServiceConfig::parse(
            r##"
[[registrations]]
name = "#Help"
[[registrations]]
name = "#help"
"##,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(EngineError::Duplicate { kind: "registration", .. })
        ));
    }

    #[test]
    fn rejects_unknown_access_flag() {
        let config = ServiceConfig::parse(
            r##"
[[registrations]]
name = "#help"
[[registrations.access]]
entity = "alice"
flags = "+tz"
"##,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(EngineError::InvalidFlags { .. })));
    }

    #[test]
    fn rejects_bad_channel_names() {
        let config = ServiceConfig::parse(
            r##"
[[channels]]
name = "help"
"##,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn load_picks_parser_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chanserv.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = ServiceConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server_name, "services.example.net");

        let other = dir.path().join("chanserv.yaml");
        std::fs::write(&other, "").unwrap();
        let err = ServiceConfig::load(other.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("no parser for extension 'yaml'"));
    }

    #[test]
    fn shipped_sample_config_is_valid() {
        let config = ServiceConfig::parse(include_str!("../../../chanserv.toml")).unwrap();
        config.validate().unwrap();
        assert!(config.registrations.iter().any(|r| r.closed.is_some()));
    }
}
