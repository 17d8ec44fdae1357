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

//! RF sensor
//!
//! Shares its summary with the RF link state. The only drill-down flag is
//! the calibration flag right after it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rf_error::Result;

use crate::address::AddressTable;
use crate::component::{expect_count, parse_all, Component, ComponentCore, Registrations};
use crate::constants::devices;
use crate::multiplexer::Connection;

pub const RF_SENSOR_FLAGS: [&str; devices::RFS_DIAG_NODES as usize] = ["txRfSensorCalibrated"];

pub struct RfSensor {
    core: ComponentCore,
    diag_request: String,
    update_request: String,
    forward_state: AtomicU32,
    reflected_state: AtomicU32,
}

impl RfSensor {
    pub const NAME: &'static str = "RFsensor";

    pub fn new(connection: Arc<Connection>, addresses: &AddressTable) -> Result<Self> {
        let mut registrations = Registrations::new(connection);
        registrations.register(Self::NAME, &[addresses.rf_link.clone()])?;

        let diag_request = format!("{}.diag", Self::NAME);
        registrations.register_bulk(diag_request.as_str(), &addresses.rf_link, devices::RFS_DIAG_NODES)?;

        let update_request = format!("{}.update", Self::NAME);
        registrations.register(
            update_request.as_str(),
            &[addresses.rfs_forward.clone(), addresses.rfs_reflected.clone()],
        )?;

        Ok(Self {
            core: ComponentCore::new(Self::NAME, 1, registrations),
            diag_request,
            update_request,
            forward_state: AtomicU32::new(0),
            reflected_state: AtomicU32::new(0),
        })
    }

    pub fn forward_state(&self) -> u32 {
        self.forward_state.load(Ordering::SeqCst)
    }

    pub fn reflected_state(&self) -> u32 {
        self.reflected_state.load(Ordering::SeqCst)
    }
}

impl Component for RfSensor {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn diagnose(&self, summary_values: &[String]) -> Result<()> {
        self.core
            .diagnose_flags(summary_values, &self.diag_request, &RF_SENSOR_FLAGS);
        Ok(())
    }

    fn refresh_readings(&self) -> Result<()> {
        let values = self.core.execute(&self.update_request)?;
        expect_count(&values, 2)?;
        let parsed: Vec<u32> = parse_all(&values)?;
        self.forward_state.store(parsed[0], Ordering::SeqCst);
        self.reflected_state.store(parsed[1], Ordering::SeqCst);
        Ok(())
    }
}
