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

//! Output stage
//!
//! The summary value is reported as-is; there is no drill-down.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rf_error::{Result, RfError};

use crate::address::AddressTable;
use crate::component::{expect_count, parse_value, Component, ComponentCore, Registrations};
use crate::multiplexer::Connection;

pub struct OutStage {
    core: ComponentCore,
    writer: Arc<Connection>,
    update_request: String,
    power_address: String,
    power: AtomicU32,
}

impl OutStage {
    pub const NAME: &'static str = "OutStage";

    pub fn new(read: Arc<Connection>, write: Arc<Connection>, addresses: &AddressTable) -> Result<Self> {
        let mut registrations = Registrations::new(read);
        registrations.register(Self::NAME, &[addresses.ostage_summary.clone()])?;

        let update_request = format!("{}.update", Self::NAME);
        registrations.register(update_request.as_str(), &[addresses.out_power.clone()])?;

        Ok(Self {
            core: ComponentCore::new(Self::NAME, 1, registrations),
            writer: write,
            update_request,
            power_address: addresses.out_power.clone(),
            power: AtomicU32::new(0),
        })
    }

    /// Output power in watts
    pub fn power(&self) -> u32 {
        self.power.load(Ordering::SeqCst)
    }

    pub fn set_power(&self, power: u32) -> Result<()> {
        self.writer.set_value(&self.power_address, power)
    }
}

impl Component for OutStage {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn diagnose(&self, _summary_values: &[String]) -> Result<()> {
        Err(RfError::UnsupportedOperation(format!(
            "{} has no diagnostic breakdown",
            Self::NAME
        )))
    }

    fn refresh_readings(&self) -> Result<()> {
        let values = self.core.execute(&self.update_request)?;
        expect_count(&values, 1)?;
        self.power.store(parse_value(&values[0])?, Ordering::SeqCst);
        Ok(())
    }

    fn update_state_and_status(&self) {
        self.core.update_raw_state();
    }
}
