/*
 * This file is part of rfsite.
 *
 * Copyright (C) 2025 rfsite contributors
 *
 * rfsite is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * rfsite is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with rfsite. If not, see <https://www.gnu.org/licenses/>.
 */


use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rf_error::{Result, RfError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::address::AddressTable;
use crate::constants::{agent, devices, paths, polling};

/// Transport parameters handed to the agent implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub host: String,
    pub port: u16,
    pub community: String,
    pub timeout_ms: u64,
    pub retries: u16,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: agent::DEFAULT_HOST.to_string(),
            port: agent::DEFAULT_PORT,
            community: agent::DEFAULT_COMMUNITY.to_string(),
            timeout_ms: agent::DEFAULT_TIMEOUT_MS,
            retries: agent::DEFAULT_RETRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmplifierConfig {
    pub count: usize,
    pub indices: Vec<u16>,
}

impl Default for AmplifierConfig {
    fn default() -> Self {
        Self {
            count: devices::AMPLIFIERS,
            indices: (1..=devices::AMPLIFIERS as u16).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub agent: AgentConfig,
    pub poll_interval_ms: u64,
    pub amplifiers: AmplifierConfig,
    pub cooling_indices: Vec<u16>,
    /// Vendor address table; any subset of fields may be overridden
    pub addresses: AddressTable,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            poll_interval_ms: polling::DEFAULT_INTERVAL_MS,
            amplifiers: AmplifierConfig::default(),
            cooling_indices: (1..=devices::COOLING_LOOPS as u16).collect(),
            addresses: AddressTable::default(),
        }
    }
}

impl SiteConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms < polling::MIN_INTERVAL_MS {
            return Err(RfError::config(format!(
                "poll_interval_ms must be at least {}, got {}",
                polling::MIN_INTERVAL_MS,
                self.poll_interval_ms
            )));
        }
        if self.agent.host.trim().is_empty() {
            return Err(RfError::config("agent host is empty"));
        }
        if self.agent.timeout_ms == 0 {
            return Err(RfError::config("agent timeout_ms must be non-zero"));
        }
        if self.amplifiers.count == 0 {
            return Err(RfError::config("amplifier count must be non-zero"));
        }
        if self.amplifiers.indices.len() != self.amplifiers.count {
            return Err(RfError::config(format!(
                "{} amplifier indices configured for {} amplifiers",
                self.amplifiers.indices.len(),
                self.amplifiers.count
            )));
        }
        if self.cooling_indices.len() != devices::COOLING_LOOPS {
            return Err(RfError::config(format!(
                "exactly {} cooling indices required, got {}",
                devices::COOLING_LOOPS,
                self.cooling_indices.len()
            )));
        }
        self.addresses.validate()
    }
}

/// `RFSITE_CONFIG` if set, else the system-wide site file
pub fn config_path() -> PathBuf {
    match env::var(paths::CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(paths::CONFIG_FILE),
    }
}

/// Read, parse and validate a site configuration file
pub fn load_site_config(path: &Path) -> Result<SiteConfig> {
    let data = fs::read_to_string(path)?;
    let config: SiteConfig = serde_json::from_str(&data)?;
    config.validate()?;
    debug!(path = %path.display(), "site configuration loaded");
    Ok(config)
}

/// Like [`load_site_config`], but a missing file yields the defaults.
///
/// A file that exists and fails to parse or validate is still an error.
pub fn load_or_default(path: &Path) -> Result<SiteConfig> {
    if !path.exists() {
        info!(path = %path.display(), "no site configuration, using defaults");
        return Ok(SiteConfig::default());
    }
    load_site_config(path)
}
