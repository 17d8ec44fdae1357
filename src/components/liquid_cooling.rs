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

//! Liquid cooling
//!
//! Two cooling loops, each with its own summary, four diagnostic flags and
//! an inlet/outlet temperature pair. The component reports the worse loop.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use rf_error::{Result, RfError};

use crate::address::{expand_template, AddressTable};
use crate::component::{
    describe_flags, expect_count, parse_all, Component, ComponentCore, Registrations,
};
use crate::constants::devices;
use crate::multiplexer::Connection;
use crate::state::HealthState;

pub const COOLING_FLAGS: [&str; devices::LQC_DIAG_NODES as usize] = [
    "lqFilterSummary",
    "lqSensorsSummary",
    "lqSiteWarning",
    "lqSiteFault",
];

pub struct LiquidCooling {
    core: ComponentCore,
    diag_requests: Vec<String>,
    update_request: String,
    in_temps: [AtomicI32; devices::COOLING_LOOPS],
    out_temps: [AtomicI32; devices::COOLING_LOOPS],
}

impl LiquidCooling {
    pub const NAME: &'static str = "LiquidCooling";

    pub fn new(connection: Arc<Connection>, addresses: &AddressTable, indices: &[u16]) -> Result<Self> {
        if indices.len() != devices::COOLING_LOOPS {
            return Err(RfError::invalid_argument(format!(
                "Liquid cooling needs exactly {} loop indices, got {}",
                devices::COOLING_LOOPS,
                indices.len()
            )));
        }

        let summary = expand_template(&addresses.lqc_summary, indices)?;
        let mut readings = expand_template(&addresses.lq_tin, indices)?;
        readings.extend(expand_template(&addresses.lq_tout, indices)?);

        let mut registrations = Registrations::new(connection);
        registrations.register(Self::NAME, &summary)?;

        let diag_requests: Vec<String> = (0..summary.len())
            .map(|i| format!("{}.diag.{}", Self::NAME, i))
            .collect();
        for (name, base) in diag_requests.iter().zip(&summary) {
            registrations.register_bulk(name.as_str(), base, devices::LQC_DIAG_NODES)?;
        }

        let update_request = format!("{}.update", Self::NAME);
        registrations.register(update_request.as_str(), &readings)?;

        Ok(Self {
            core: ComponentCore::new(Self::NAME, summary.len(), registrations),
            diag_requests,
            update_request,
            in_temps: Default::default(),
            out_temps: Default::default(),
        })
    }

    /// Inlet temperatures, one per loop
    pub fn in_temps(&self) -> [i32; devices::COOLING_LOOPS] {
        std::array::from_fn(|i| self.in_temps[i].load(Ordering::SeqCst))
    }

    /// Outlet temperatures, one per loop
    pub fn out_temps(&self) -> [i32; devices::COOLING_LOOPS] {
        std::array::from_fn(|i| self.out_temps[i].load(Ordering::SeqCst))
    }

    /// State of one loop, drilling into it unless it reads `OK`
    fn loop_state(&self, device: usize, value: &str) -> (HealthState, String) {
        let state = match HealthState::parse(value) {
            Ok(state) => state,
            Err(e) => return (HealthState::Unknown, format!("{}: {}", device + 1, e)),
        };
        if state == HealthState::Ok {
            return (state, format!("{}: {}", device + 1, state));
        }

        match self
            .core
            .execute(&self.diag_requests[device])
            .and_then(|values| describe_flags(&COOLING_FLAGS, &values))
        {
            Ok(detail) => (state, format!("{} detailed status:\n{}", device + 1, detail)),
            Err(e) => (HealthState::Unknown, format!("{}: {}", device + 1, e)),
        }
    }
}

impl Component for LiquidCooling {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn diagnose(&self, summary_values: &[String]) -> Result<()> {
        expect_count(summary_values, devices::COOLING_LOOPS)?;

        let (first, first_status) = self.loop_state(0, &summary_values[0]);
        let (second, second_status) = self.loop_state(1, &summary_values[1]);

        // Lower ordinal is the worse loop: FAULT beats WARNING, OFF beats OK
        let state = first.min(second);
        self.core
            .set_state_and_status(state, &format!("{}\n{}", first_status, second_status));
        Ok(())
    }

    fn refresh_readings(&self) -> Result<()> {
        let values = self.core.execute(&self.update_request)?;
        expect_count(&values, 2 * devices::COOLING_LOOPS)?;
        let parsed: Vec<i32> = parse_all(&values)?;
        let (inlets, outlets) = parsed.split_at(devices::COOLING_LOOPS);
        for (slot, value) in self.in_temps.iter().zip(inlets) {
            slot.store(*value, Ordering::SeqCst);
        }
        for (slot, value) in self.out_temps.iter().zip(outlets) {
            slot.store(*value, Ordering::SeqCst);
        }
        Ok(())
    }
}
