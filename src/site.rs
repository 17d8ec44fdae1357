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

//! Site composition
//!
//! Builds the six components of one site against a read connection and a
//! write connection, and drives them through a poll cycle.

use std::sync::Arc;

use rf_error::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::component::Component;
use crate::components::{Amplifiers, LiquidCooling, Mtx, OutStage, RfSensor, Transmitter};
use crate::config::SiteConfig;
use crate::multiplexer::Connection;
use crate::state::HealthState;

/// One monitored subsystem of the site
pub enum SiteComponent {
    Amplifiers(Amplifiers),
    LiquidCooling(LiquidCooling),
    Transmitter(Transmitter),
    OutStage(OutStage),
    RfSensor(RfSensor),
    Mtx(Mtx),
}

impl SiteComponent {
    pub fn as_component(&self) -> &dyn Component {
        match self {
            SiteComponent::Amplifiers(c) => c,
            SiteComponent::LiquidCooling(c) => c,
            SiteComponent::Transmitter(c) => c,
            SiteComponent::OutStage(c) => c,
            SiteComponent::RfSensor(c) => c,
            SiteComponent::Mtx(c) => c,
        }
    }
}

/// Snapshot of one component after a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentReport {
    pub name: String,
    pub state: HealthState,
    pub status: String,
    pub data_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteReport {
    pub components: Vec<ComponentReport>,
}

impl SiteReport {
    pub fn component(&self, name: &str) -> Option<&ComponentReport> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Worst state over all components, by ordinal
    pub fn worst_state(&self) -> Option<HealthState> {
        self.components.iter().map(|c| c.state).min()
    }
}

pub struct Site {
    components: Vec<SiteComponent>,
    read: Arc<Connection>,
    write: Arc<Connection>,
}

impl Site {
    /// Construct every component; the first failure aborts and unregisters
    /// whatever was already built.
    pub fn new(config: &SiteConfig, read: Arc<Connection>, write: Arc<Connection>) -> Result<Self> {
        let addresses = &config.addresses;
        let components = vec![
            SiteComponent::Amplifiers(Amplifiers::with_count(
                read.clone(),
                addresses,
                &config.amplifiers.indices,
                config.amplifiers.count,
            )?),
            SiteComponent::LiquidCooling(LiquidCooling::new(
                read.clone(),
                addresses,
                &config.cooling_indices,
            )?),
            SiteComponent::Transmitter(Transmitter::new(read.clone(), write.clone(), addresses)?),
            SiteComponent::OutStage(OutStage::new(read.clone(), write.clone(), addresses)?),
            SiteComponent::RfSensor(RfSensor::new(read.clone(), addresses)?),
            SiteComponent::Mtx(Mtx::new(read.clone(), write.clone(), addresses)?),
        ];

        info!(
            components = components.len(),
            requests = read.request_count(),
            amplifiers = config.amplifiers.count,
            "site constructed"
        );
        Ok(Self {
            components,
            read,
            write,
        })
    }

    pub fn components(&self) -> &[SiteComponent] {
        &self.components
    }

    pub fn read_connection(&self) -> &Arc<Connection> {
        &self.read
    }

    pub fn write_connection(&self) -> &Arc<Connection> {
        &self.write
    }

    /// One poll cycle: state and status first, then readings, per component
    pub fn poll_once(&self) {
        for component in &self.components {
            let component = component.as_component();
            component.update_state_and_status();
            component.update_read_parameters();
            debug!(component = component.name(), state = %component.state(), "polled");
        }
    }

    pub fn report(&self) -> SiteReport {
        SiteReport {
            components: self
                .components
                .iter()
                .map(|c| {
                    let c = c.as_component();
                    let (state, status) = c.state_and_status();
                    ComponentReport {
                        name: c.name().to_string(),
                        state,
                        status,
                        data_valid: c.data_valid(),
                    }
                })
                .collect(),
        }
    }

    pub fn amplifiers(&self) -> Option<&Amplifiers> {
        self.components.iter().find_map(|c| match c {
            SiteComponent::Amplifiers(a) => Some(a),
            _ => None,
        })
    }

    pub fn liquid_cooling(&self) -> Option<&LiquidCooling> {
        self.components.iter().find_map(|c| match c {
            SiteComponent::LiquidCooling(l) => Some(l),
            _ => None,
        })
    }

    pub fn transmitter(&self) -> Option<&Transmitter> {
        self.components.iter().find_map(|c| match c {
            SiteComponent::Transmitter(t) => Some(t),
            _ => None,
        })
    }

    pub fn out_stage(&self) -> Option<&OutStage> {
        self.components.iter().find_map(|c| match c {
            SiteComponent::OutStage(o) => Some(o),
            _ => None,
        })
    }

    pub fn rf_sensor(&self) -> Option<&RfSensor> {
        self.components.iter().find_map(|c| match c {
            SiteComponent::RfSensor(r) => Some(r),
            _ => None,
        })
    }

    pub fn mtx(&self) -> Option<&Mtx> {
        self.components.iter().find_map(|c| match c {
            SiteComponent::Mtx(m) => Some(m),
            _ => None,
        })
    }
}
