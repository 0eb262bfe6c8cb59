//! `selfheal config`: print the effective configuration.

use anyhow::Result;
use serde::Serialize;

use crate::cli::display::{output, CommandOutput};
use crate::domain::models::config::Config;

const REDACTED: &str = "********";

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    #[serde(flatten)]
    pub config: Config,
}

impl ConfigOutput {
    /// Copy of `config` with every secret replaced.
    pub fn redacted(config: &Config) -> Self {
        let mut config = config.clone();
        for secret in [
            &mut config.llm.groq.api_key,
            &mut config.llm.gemini.api_key,
            &mut config.github.token,
        ] {
            if secret.is_some() {
                *secret = Some(REDACTED.to_string());
            }
        }
        Self { config }
    }
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_default()
    }
}

pub fn execute(config: &Config, json_mode: bool) -> Result<()> {
    output(&ConfigOutput::redacted(config), json_mode);
    Ok(())
}
