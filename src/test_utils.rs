/*
 * Test utilities for rfsite
 *
 * Builds simulated agents populated for the default address table and
 * helpers to push single devices into a given state.
 */

use std::sync::Arc;

use crate::address::{expand_template, AddressTable};
use crate::config::{AmplifierConfig, SiteConfig};
use crate::multiplexer::Connection;
use crate::simulated::{successors, SimulatedAgent};
use crate::state::HealthState;

/// Configuration for a site with the given amplifier and cooling indices
pub fn site_config(amp_indices: &[u16], cooling_indices: &[u16]) -> SiteConfig {
    SiteConfig {
        amplifiers: AmplifierConfig {
            count: amp_indices.len(),
            indices: amp_indices.to_vec(),
        },
        cooling_indices: cooling_indices.to_vec(),
        ..SiteConfig::default()
    }
}

/// Agent answering every default address with a nominal value
pub fn healthy_agent(amp_indices: &[u16], cooling_indices: &[u16]) -> SimulatedAgent {
    SimulatedAgent::healthy_site(&site_config(amp_indices, cooling_indices)).unwrap()
}

/// Summary address of amplifier `index`; its flags follow it
pub fn amp_flags_base(index: u16) -> String {
    expand_template(&AddressTable::default().amp_summary, &[index]).unwrap().remove(0)
}

pub fn cooling_summary(index: u16) -> String {
    expand_template(&AddressTable::default().lqc_summary, &[index]).unwrap().remove(0)
}

pub fn set_amp_state(agent: &SimulatedAgent, index: u16, state: HealthState) {
    agent.insert(&amp_flags_base(index), state.ordinal()).unwrap();
}

/// Set drill-down flag `flag` (0-based) of amplifier `index`
pub fn set_amp_flag(agent: &SimulatedAgent, index: u16, flag: usize, state: HealthState) {
    let flags = successors(&amp_flags_base(index), 15).unwrap();
    agent.insert(&flags[flag], state.ordinal()).unwrap();
}

pub fn set_cooling_state(agent: &SimulatedAgent, index: u16, state: HealthState) {
    agent.insert(&cooling_summary(index), state.ordinal()).unwrap();
}

/// Set drill-down flag `flag` (0-based) of cooling loop `index`
pub fn set_cooling_flag(agent: &SimulatedAgent, index: u16, flag: usize, state: HealthState) {
    let flags = successors(&cooling_summary(index), 4).unwrap();
    agent.insert(&flags[flag], state.ordinal()).unwrap();
}

/// Read and write connections sharing one agent, as the poller sets them up
pub fn connections(agent: &SimulatedAgent) -> (Arc<Connection>, Arc<Connection>) {
    (
        Connection::shared("read", agent.clone()),
        Connection::shared("write", agent.clone()),
    )
}
