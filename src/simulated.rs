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

//! In-memory management agent
//!
//! Holds an ordered address table and answers GET, bulk walk and SET the way
//! a real agent does: unknown addresses come back as `noSuchObject`, and a
//! walk past the end of the table is padded with `endOfMibView`. Clones share
//! the same table, so a read connection and a write connection built from one
//! simulated agent see each other's writes.
//!
//! Used by the test suites and by the poller's snapshot replay mode.

use std::collections::BTreeMap;
use std::fs;
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rf_error::{Result, RfError};
use tracing::debug;

use crate::address::expand_template;
use crate::agent::{Agent, Value, VarBind, WriteValue};
use crate::config::SiteConfig;
use crate::constants::{agent::NO_RESPONSE, devices};
use crate::state::HealthState;

/// Numeric address key, ordered component by component
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct AddressKey(Vec<u32>);

impl AddressKey {
    fn parse(address: &str) -> Result<Self> {
        let parts = address
            .trim()
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| RfError::protocol(format!("Malformed address: {}", address)))?;
        Ok(Self(parts))
    }
}

/// How many of each request kind the agent has served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCounts {
    pub get: usize,
    pub bulk: usize,
    pub set: usize,
}

#[derive(Debug, Default)]
struct AgentState {
    table: BTreeMap<AddressKey, (String, Value)>,
    offline: bool,
    counts: RequestCounts,
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedAgent {
    state: Arc<Mutex<AgentState>>,
}

impl SimulatedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot: a JSON object mapping addresses to numbers or strings
    pub fn from_snapshot(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(&data)?;
        let agent = Self::new();
        for (address, raw) in entries {
            let value = match raw {
                serde_json::Value::String(s) => Value::Text(s),
                serde_json::Value::Number(n) => number_value(&n).ok_or_else(|| {
                    RfError::config(format!("value for {} is out of range: {}", address, n))
                })?,
                other => {
                    return Err(RfError::config(format!(
                        "value for {} must be a number or string, got {}",
                        address, other
                    )))
                }
            };
            agent.insert(&address, value)?;
        }
        debug!(path = %path.display(), entries = agent.len(), "snapshot loaded");
        Ok(agent)
    }

    pub fn insert(&self, address: &str, value: impl Into<Value>) -> Result<()> {
        let key = AddressKey::parse(address)?;
        self.state
            .lock()
            .table
            .insert(key, (address.trim().to_string(), value.into()));
        Ok(())
    }

    pub fn remove(&self, address: &str) -> bool {
        match AddressKey::parse(address) {
            Ok(key) => self.state.lock().table.remove(&key).is_some(),
            Err(_) => false,
        }
    }

    pub fn value(&self, address: &str) -> Option<Value> {
        let key = AddressKey::parse(address).ok()?;
        self.state.lock().table.get(&key).map(|(_, v)| v.clone())
    }

    pub fn len(&self) -> usize {
        self.state.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// While offline every request fails as an unanswered request would
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    pub fn request_counts(&self) -> RequestCounts {
        self.state.lock().counts
    }

    /// Populate every address a site with this configuration reads, all nominal.
    ///
    /// Drill-down flags are placed on the successor addresses of each summary,
    /// which is where the vendor firmware keeps them.
    pub fn healthy_site(config: &SiteConfig) -> Result<Self> {
        let agent = Self::new();
        let ok = HealthState::Ok.ordinal();
        let addresses = &config.addresses;

        let amp_summaries = expand_template(&addresses.amp_summary, &config.amplifiers.indices)?;
        for summary in &amp_summaries {
            agent.insert(summary, ok)?;
            agent.insert_successors(summary, devices::AMP_DIAG_NODES, ok)?;
        }
        for switch in expand_template(&addresses.amp_on, &config.amplifiers.indices)? {
            agent.insert(&switch, ok)?;
        }

        for summary in expand_template(&addresses.lqc_summary, &config.cooling_indices)? {
            agent.insert(&summary, ok)?;
            agent.insert_successors(&summary, devices::LQC_DIAG_NODES, ok)?;
        }
        for (i, inlet) in expand_template(&addresses.lq_tin, &config.cooling_indices)?.iter().enumerate() {
            agent.insert(inlet, 18 + i as i32)?;
        }
        for (i, outlet) in expand_template(&addresses.lq_tout, &config.cooling_indices)?.iter().enumerate() {
            agent.insert(outlet, 27 + i as i32)?;
        }

        agent.insert(&addresses.trans_summary, ok)?;
        agent.insert_successors(&addresses.trans_summary, devices::TRANS_DIAG_NODES, ok)?;
        agent.insert(&addresses.trans_fp, 1000u32)?;
        agent.insert(&addresses.trans_rp, 12u32)?;
        agent.insert(&addresses.trans_pae, 64)?;
        agent.insert(&addresses.trans_on, 1)?;
        agent.insert(&addresses.nominal_power, 1000u32)?;
        agent.insert(&addresses.trans_reset, 1)?;

        agent.insert(&addresses.mtx_summary, ok)?;
        agent.insert(&addresses.mtx_reset, 1)?;

        agent.insert(&addresses.ostage_summary, ok)?;
        agent.insert(&addresses.out_power, 950u32)?;

        agent.insert(&addresses.rf_link, ok)?;
        agent.insert_successors(&addresses.rf_link, devices::RFS_DIAG_NODES, ok)?;
        agent.insert(&addresses.rfs_forward, ok)?;
        agent.insert(&addresses.rfs_reflected, ok)?;

        Ok(agent)
    }

    /// Fill `count` addresses following `base` (last component incremented)
    pub fn insert_successors(&self, base: &str, count: u16, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        for address in successors(base, count)? {
            self.insert(&address, value.clone())?;
        }
        Ok(())
    }

    fn check_online(state: &AgentState) -> Result<()> {
        if state.offline {
            Err(RfError::protocol(NO_RESPONSE))
        } else {
            Ok(())
        }
    }
}

/// The `count` addresses after `base`, incrementing its last component
pub fn successors(base: &str, count: u16) -> Result<Vec<String>> {
    let (prefix, last) = base
        .trim()
        .rsplit_once('.')
        .ok_or_else(|| RfError::protocol(format!("Malformed address: {}", base)))?;
    let last = last
        .parse::<u32>()
        .map_err(|_| RfError::protocol(format!("Malformed address: {}", base)))?;
    (1..=u32::from(count))
        .map(|step| {
            let next = last.checked_add(step).ok_or_else(|| {
                RfError::protocol(format!("No successor {} after {}", step, base))
            })?;
            Ok(format!("{}.{}", prefix, next))
        })
        .collect()
}

fn number_value(n: &serde_json::Number) -> Option<Value> {
    let raw = n.as_i64()?;
    if let Ok(v) = i32::try_from(raw) {
        Some(Value::Integer(v))
    } else {
        u32::try_from(raw).ok().map(Value::Unsigned)
    }
}

impl Agent for SimulatedAgent {
    fn get(&mut self, addresses: &[String]) -> Result<Vec<VarBind>> {
        let mut state = self.state.lock();
        Self::check_online(&state)?;
        state.counts.get += 1;

        addresses
            .iter()
            .map(|address| {
                let key = AddressKey::parse(address)?;
                let value = state
                    .table
                    .get(&key)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::NoSuchObject);
                Ok(VarBind::new(address.clone(), value))
            })
            .collect()
    }

    fn get_bulk(&mut self, base: &str, count: u16) -> Result<Vec<VarBind>> {
        let mut state = self.state.lock();
        Self::check_online(&state)?;
        state.counts.bulk += 1;

        let key = AddressKey::parse(base)?;
        let mut bindings: Vec<VarBind> = state
            .table
            .range((Bound::Excluded(key), Bound::Unbounded))
            .take(usize::from(count))
            .map(|(_, (address, value))| VarBind::new(address.clone(), value.clone()))
            .collect();
        let last = bindings
            .last()
            .map(|vb| vb.address.clone())
            .unwrap_or_else(|| base.to_string());
        while bindings.len() < usize::from(count) {
            bindings.push(VarBind::new(last.clone(), Value::EndOfMibView));
        }
        Ok(bindings)
    }

    fn set(&mut self, address: &str, value: &WriteValue) -> Result<()> {
        let key = AddressKey::parse(address)?;
        let mut state = self.state.lock();
        Self::check_online(&state)?;
        state.counts.set += 1;
        state
            .table
            .insert(key, (address.trim().to_string(), value.clone().into()));
        Ok(())
    }
}
