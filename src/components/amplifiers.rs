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

//! Amplifier bank
//!
//! Each amplifier has its own summary address, obtained by expanding the
//! amplifier template with the amplifier's index. A non-nominal amplifier is
//! drilled into through a bulk walk of its 15 diagnostic flags.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use rf_error::{Result, RfError};

use crate::address::{expand_template, AddressTable};
use crate::component::{
    describe_flags, expect_count, parse_all, Component, ComponentCore, Registrations,
};
use crate::constants::devices;
use crate::multiplexer::Connection;
use crate::state::{DeviceAggregate, HealthState};

/// Diagnostic flags, in walk order after each amplifier summary
pub const AMPLIFIER_FLAGS: [&str; devices::AMP_DIAG_NODES as usize] = [
    "txAmpRfPowerFail",
    "txAmpReflection",
    "txAmpSupplyFail",
    "txAmpRfInFail",
    "txAmpMute",
    "txAmpTemperatureFail",
    "txAmpTransistorFail",
    "txAmpRegulationFail",
    "txAmpAcFail",
    "txAmpDcFail",
    "txAmpLink",
    "txAmpBiasFail",
    "txAmpInitFail",
    "txAmpAbsorberFail",
    "txAmpOn",
];

pub struct Amplifiers {
    core: ComponentCore,
    diag_requests: Vec<String>,
    update_request: String,
    amp_on: Vec<AtomicI32>,
}

impl Amplifiers {
    pub const NAME: &'static str = "AMPs";

    /// Amplifier bank of the standard size
    pub fn new(connection: Arc<Connection>, addresses: &AddressTable, indices: &[u16]) -> Result<Self> {
        Self::with_count(connection, addresses, indices, devices::AMPLIFIERS)
    }

    /// Amplifier bank of `count` amplifiers; `indices` must list exactly that many
    pub fn with_count(
        connection: Arc<Connection>,
        addresses: &AddressTable,
        indices: &[u16],
        count: usize,
    ) -> Result<Self> {
        if indices.len() != count {
            return Err(RfError::invalid_argument(format!(
                "Incorrect number of amplifier indices provided: expected {}, got {}",
                count,
                indices.len()
            )));
        }

        let summary = expand_template(&addresses.amp_summary, indices)?;
        let switches = expand_template(&addresses.amp_on, indices)?;

        let mut registrations = Registrations::new(connection);
        registrations.register(Self::NAME, &summary)?;

        let diag_requests: Vec<String> = (0..summary.len())
            .map(|i| format!("{}.diag.{}", Self::NAME, i))
            .collect();
        for (name, base) in diag_requests.iter().zip(&summary) {
            registrations.register_bulk(name.as_str(), base, devices::AMP_DIAG_NODES)?;
        }

        let update_request = format!("{}.update", Self::NAME);
        registrations.register(update_request.as_str(), &switches)?;

        Ok(Self {
            core: ComponentCore::new(Self::NAME, summary.len(), registrations),
            diag_requests,
            update_request,
            amp_on: (0..count).map(|_| AtomicI32::new(0)).collect(),
        })
    }

    pub fn amplifier_count(&self) -> usize {
        self.amp_on.len()
    }

    /// Output switch of amplifier `index` (0-based), on when it reads `OK`
    pub fn amp_on(&self, index: usize) -> Result<bool> {
        let slot = self.amp_on.get(index).ok_or_else(|| {
            RfError::invalid_argument(format!(
                "Not that many amplifiers in the system: {} >= {}",
                index,
                self.amp_on.len()
            ))
        })?;
        Ok(slot.load(Ordering::SeqCst) == HealthState::Ok.ordinal())
    }

    fn drill_down(&self, device: usize) -> Result<String> {
        let values = self.core.execute(&self.diag_requests[device])?;
        describe_flags(&AMPLIFIER_FLAGS, &values)
    }
}

impl Component for Amplifiers {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn diagnose(&self, summary_values: &[String]) -> Result<()> {
        if let Err(e) = expect_count(summary_values, self.diag_requests.len()) {
            self.core.record_failure(&e);
            return Ok(());
        }

        let mut aggregate = DeviceAggregate::default();
        let mut lines = Vec::with_capacity(summary_values.len());

        for (i, value) in summary_values.iter().enumerate() {
            let device = i + 1;
            match HealthState::parse(value) {
                Ok(HealthState::Ok) => {
                    aggregate.observe(HealthState::Ok);
                    lines.push(format!("{}: ON", device));
                }
                Ok(HealthState::Off) => {
                    aggregate.observe(HealthState::Off);
                    lines.push(format!("{}: OFF", device));
                }
                Ok(state) => {
                    aggregate.observe(state);
                    match self.drill_down(i) {
                        Ok(detail) => lines.push(format!("{} detailed status:\n{}", device, detail)),
                        Err(e) => {
                            aggregate.observe(HealthState::Unknown);
                            lines.push(format!("{}: {}", device, e));
                        }
                    }
                }
                Err(e) => {
                    aggregate.observe(HealthState::Unknown);
                    lines.push(format!("{}: {}", device, e));
                }
            }
        }

        self.core
            .set_state_and_status(aggregate.finish(), &lines.join("\n"));
        Ok(())
    }

    fn refresh_readings(&self) -> Result<()> {
        let values = self.core.execute(&self.update_request)?;
        expect_count(&values, self.amp_on.len())?;
        let parsed: Vec<i32> = parse_all(&values)?;
        for (slot, value) in self.amp_on.iter().zip(parsed) {
            slot.store(value, Ordering::SeqCst);
        }
        Ok(())
    }
}
