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

//! Multiplexed transmitter controller
//!
//! Reports its summary straight through and has no readings. The only
//! operation is a reset through the write connection.

use std::sync::Arc;

use rf_error::Result;

use crate::address::AddressTable;
use crate::component::{Component, ComponentCore, Registrations};
use crate::constants::commands;
use crate::multiplexer::Connection;

pub struct Mtx {
    core: ComponentCore,
    writer: Arc<Connection>,
    reset_address: String,
}

impl Mtx {
    pub const NAME: &'static str = "MTx";

    pub fn new(read: Arc<Connection>, write: Arc<Connection>, addresses: &AddressTable) -> Result<Self> {
        let mut registrations = Registrations::new(read);
        registrations.register(Self::NAME, &[addresses.mtx_summary.clone()])?;

        Ok(Self {
            core: ComponentCore::new(Self::NAME, 1, registrations),
            writer: write,
            reset_address: addresses.mtx_reset.clone(),
        })
    }

    pub fn reset(&self) -> Result<()> {
        self.writer.set_value(&self.reset_address, commands::RESET_VALUE)
    }
}

impl Component for Mtx {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn diagnose(&self, _summary_values: &[String]) -> Result<()> {
        Ok(())
    }

    fn refresh_readings(&self) -> Result<()> {
        Ok(())
    }

    fn update_state_and_status(&self) {
        self.core.update_raw_state();
    }

    // No readings, so data_valid never turns true
    fn update_read_parameters(&self) {}
}
