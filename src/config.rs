//! Configuration management for the inscription minter
//!
//! Settings come from the process environment, overridden by `.env` and then
//! `.env.local` when those files exist.

use crate::payload::InscriptionPayload;
use crate::submission::RetryPolicy;

use anyhow::{Context, Result};
use config::{Config, Environment, Map};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Override files, applied in order; later files win
pub const OVERRIDE_FILES: [&str; 2] = [".env", ".env.local"];

/// Root configuration structure
#[derive(Clone, Deserialize)]
pub struct Settings {
    /// Number of mints to perform; zero or negative mints nothing
    pub amount_call: i64,
    /// EVM JSON-RPC endpoint
    pub polygon_rpc: String,
    /// Hex-encoded secp256k1 key
    pub private_key: String,
    /// Recipient of every mint transaction
    pub to_address: String,

    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub amount: String,

    #[serde(default)]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub fail_fast_on_config_error: bool,
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Settings {
    /// Load settings from the environment and the override files
    pub fn load() -> Result<Self> {
        let files: Vec<PathBuf> = OVERRIDE_FILES.iter().map(PathBuf::from).collect();
        let process_env = env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::from_sources(process_env, &files)
    }

    /// Merge a base set of variables with override files and parse the result
    pub fn from_sources<I>(base: I, override_files: &[PathBuf]) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: Map<String, String> = base.into_iter().collect();
        for path in override_files {
            apply_override_file(&mut vars, path);
        }
        Self::from_map(vars)
    }

    /// Parse settings from an already merged variable map. Empty values count
    /// as unset.
    pub fn from_map(vars: Map<String, String>) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(Environment::default().ignore_empty(true).source(Some(vars)))
            .build()
            .context("Failed to assemble configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.polygon_rpc.trim().is_empty() {
            anyhow::bail!("POLYGON_RPC must not be empty");
        }
        if self.private_key.trim().is_empty() {
            anyhow::bail!("PRIVATE_KEY must not be empty");
        }
        if self.to_address.trim().is_empty() {
            anyhow::bail!("TO_ADDRESS must not be empty");
        }

        if self.amount_call < 0 {
            warn!("AMOUNT_CALL is {}, nothing will be minted", self.amount_call);
        }

        for (name, value) in [
            ("PROTOCOL", &self.protocol),
            ("OPERATION", &self.operation),
            ("SYMBOL", &self.symbol),
            ("AMOUNT", &self.amount),
        ] {
            if value.is_empty() {
                warn!("{} is empty, the inscription will carry an empty field", name);
            }
        }

        Ok(())
    }

    /// Mints to perform, with negative counts treated as zero
    pub fn mint_count(&self) -> u64 {
        u64::try_from(self.amount_call).unwrap_or(0)
    }

    /// Inscription payload described by the configuration
    pub fn payload(&self) -> InscriptionPayload {
        InscriptionPayload::new(&self.protocol, &self.operation, &self.symbol, &self.amount)
    }

    /// Retry behaviour for failed attempts
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_millis(self.retry_delay_ms),
            max_attempts: self.max_retries,
            fail_fast_on_config: self.fail_fast_on_config_error,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("amount_call", &self.amount_call)
            .field("polygon_rpc", &self.polygon_rpc)
            .field("private_key", &"<redacted>")
            .field("to_address", &self.to_address)
            .field("protocol", &self.protocol)
            .field("operation", &self.operation)
            .field("symbol", &self.symbol)
            .field("amount", &self.amount)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("fail_fast_on_config_error", &self.fail_fast_on_config_error)
            .field("metrics_port", &self.metrics_port)
            .finish()
    }
}

/// Apply one dotenv file on top of `vars`. A file is applied whole or not at all.
// The iterator API is deprecated in dotenv, but it is the only one that parses
// a file without writing into the process environment.
#[allow(deprecated)]
fn apply_override_file(vars: &mut Map<String, String>, path: &Path) {
    if !path.exists() {
        debug!("Override file {:?} not found, skipping", path);
        return;
    }

    let entries = dotenv::from_path_iter(path)
        .and_then(|iter| iter.collect::<Result<Vec<(String, String)>, _>>());

    match entries {
        Ok(entries) => {
            debug!("Applying {} entries from {:?}", entries.len(), path);
            vars.extend(entries);
        }
        Err(e) => warn!("Load env error for {:?}: {}", path, e),
    }
}
