//! HCL front-end for the service configuration.
//!
//! Use attribute syntax for lists: `registrations = [{ name = "#help" }]`.

use chanserv_engine::config::{ConfigParser, ServiceConfig};
use chanserv_engine::error::EngineError;

pub struct HclParser;

impl ConfigParser for HclParser {
    fn extensions(&self) -> &[&str] {
        &["hcl"]
    }

    fn parse(&self, content: &str) -> Result<ServiceConfig, EngineError> {
        hcl::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }
}
