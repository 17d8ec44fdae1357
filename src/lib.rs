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


//! rfsite - RF transmission site health monitoring
//!
//! This library polls a remote management agent for the summary readings of
//! each site subsystem, drills into the detailed flags of any subsystem that
//! is not nominal, and keeps one state and status per subsystem for an
//! operator console or poller to read.

pub mod address;
pub mod agent;
pub mod component;
pub mod components;
pub mod config;
pub mod constants;
pub mod multiplexer;
pub mod simulated;
pub mod site;
pub mod state;

#[cfg(test)]
mod test_utils;

pub use address::{expand_template, AddressTable};
pub use agent::{Agent, Value, VarBind, WriteValue};
pub use component::Component;
pub use components::{Amplifiers, LiquidCooling, Mtx, OutStage, PowerSwitch, RfSensor, Transmitter};
pub use config::{config_path, load_or_default, load_site_config, AgentConfig, AmplifierConfig, SiteConfig};
pub use multiplexer::{Connection, RequestMultiplexer};
pub use rf_error::{Result, RfError};
pub use simulated::SimulatedAgent;
pub use site::{ComponentReport, Site, SiteComponent, SiteReport};
pub use state::{DeviceAggregate, HealthState};
