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

//! Transmitter
//!
//! Summary state with four drill-down flags, power readings, and the
//! commands an operator issues through the write connection.

use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;

use rf_error::Result;

use crate::address::AddressTable;
use crate::component::{expect_count, parse_value, Component, ComponentCore, Registrations};
use crate::constants::{commands, devices};
use crate::multiplexer::Connection;

pub const TRANSMITTER_FLAGS: [&str; devices::TRANS_DIAG_NODES as usize] =
    ["txRF", "txReflection", "txRfSensorSummary", "txLocal"];

const READINGS: usize = 5;

/// Transmitter on/off command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSwitch {
    On,
    Off,
}

impl PowerSwitch {
    fn command(self) -> i32 {
        match self {
            PowerSwitch::On => commands::SWITCH_ON,
            PowerSwitch::Off => commands::SWITCH_OFF,
        }
    }
}

pub struct Transmitter {
    core: ComponentCore,
    writer: Arc<Connection>,
    diag_request: String,
    update_request: String,
    reset_address: String,
    switch_address: String,
    nominal_power_address: String,

    forward_power: AtomicU32,
    reflected_power: AtomicU32,
    pa_efficiency: AtomicI32,
    switch_on: AtomicI32,
    nominal_power: AtomicU32,
}

impl Transmitter {
    pub const NAME: &'static str = "Transmitter";

    pub fn new(read: Arc<Connection>, write: Arc<Connection>, addresses: &AddressTable) -> Result<Self> {
        let mut registrations = Registrations::new(read);
        registrations.register(Self::NAME, &[addresses.trans_summary.clone()])?;

        let diag_request = format!("{}.diag", Self::NAME);
        registrations.register_bulk(
            diag_request.as_str(),
            &addresses.trans_summary,
            devices::TRANS_DIAG_NODES,
        )?;

        let update_request = format!("{}.update", Self::NAME);
        registrations.register(
            update_request.as_str(),
            &[
                addresses.trans_fp.clone(),
                addresses.trans_rp.clone(),
                addresses.trans_pae.clone(),
                addresses.trans_on.clone(),
                addresses.nominal_power.clone(),
            ],
        )?;

        Ok(Self {
            core: ComponentCore::new(Self::NAME, 1, registrations),
            writer: write,
            diag_request,
            update_request,
            reset_address: addresses.trans_reset.clone(),
            switch_address: addresses.trans_on.clone(),
            nominal_power_address: addresses.nominal_power.clone(),
            forward_power: AtomicU32::new(0),
            reflected_power: AtomicU32::new(0),
            pa_efficiency: AtomicI32::new(0),
            switch_on: AtomicI32::new(0),
            nominal_power: AtomicU32::new(0),
        })
    }

    pub fn forward_power(&self) -> u32 {
        self.forward_power.load(Ordering::SeqCst)
    }

    pub fn reflected_power(&self) -> u32 {
        self.reflected_power.load(Ordering::SeqCst)
    }

    /// Power amplifier efficiency in percent
    pub fn pa_efficiency(&self) -> i32 {
        self.pa_efficiency.load(Ordering::SeqCst)
    }

    /// Raw on/off switch reading (1 on, 2 off)
    pub fn switch_on(&self) -> i32 {
        self.switch_on.load(Ordering::SeqCst)
    }

    pub fn nominal_power(&self) -> u32 {
        self.nominal_power.load(Ordering::SeqCst)
    }

    pub fn reset(&self) -> Result<()> {
        self.writer.set_value(&self.reset_address, commands::RESET_VALUE)
    }

    pub fn power_switch(&self, switch: PowerSwitch) -> Result<()> {
        self.writer.set_value(&self.switch_address, switch.command())
    }

    pub fn set_nominal_power(&self, power: u32) -> Result<()> {
        self.writer.set_value(&self.nominal_power_address, power)
    }
}

impl Component for Transmitter {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn diagnose(&self, summary_values: &[String]) -> Result<()> {
        self.core
            .diagnose_flags(summary_values, &self.diag_request, &TRANSMITTER_FLAGS);
        Ok(())
    }

    fn refresh_readings(&self) -> Result<()> {
        let values = self.core.execute(&self.update_request)?;
        expect_count(&values, READINGS)?;

        let forward: u32 = parse_value(&values[0])?;
        let reflected: u32 = parse_value(&values[1])?;
        let efficiency: i32 = parse_value(&values[2])?;
        let switch_on: i32 = parse_value(&values[3])?;
        let nominal: u32 = parse_value(&values[4])?;

        self.forward_power.store(forward, Ordering::SeqCst);
        self.reflected_power.store(reflected, Ordering::SeqCst);
        self.pa_efficiency.store(efficiency, Ordering::SeqCst);
        self.switch_on.store(switch_on, Ordering::SeqCst);
        self.nominal_power.store(nominal, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{MockAgent, Value, VarBind};
    use crate::simulated::{successors, SimulatedAgent};
    use crate::state::HealthState;
    use crate::test_utils::healthy_agent;
    use rf_error::RfError;

    fn transmitter(agent: &SimulatedAgent) -> Transmitter {
        let read = Connection::shared("read", agent.clone());
        let write = Connection::shared("write", agent.clone());
        Transmitter::new(read, write, &AddressTable::default()).unwrap()
    }

    #[test]
    fn test_nominal_summary_is_ok() {
        let agent = healthy_agent(&[1], &[1, 2]);
        let tx = transmitter(&agent);
        tx.update_state_and_status();
        assert_eq!(tx.state_and_status(), (HealthState::Ok, "Transmitter: OK".to_string()));
        assert_eq!(agent.request_counts().bulk, 0);
    }

    #[test]
    fn test_warning_summary_lists_flags() {
        let agent = healthy_agent(&[1], &[1, 2]);
        let addresses = AddressTable::default();
        agent.insert(&addresses.trans_summary, HealthState::Warning.ordinal()).unwrap();
        let flags = successors(&addresses.trans_summary, devices::TRANS_DIAG_NODES).unwrap();
        agent.insert(&flags[1], HealthState::Warning.ordinal()).unwrap();

        let tx = transmitter(&agent);
        tx.update_state_and_status();

        assert_eq!(tx.state(), HealthState::Warning);
        assert_eq!(
            tx.status(),
            "Transmitter: detailed status:\ntxRF: OK\ntxReflection: WARNING\ntxRfSensorSummary: OK\ntxLocal: OK"
        );
    }

    #[test]
    fn test_short_drill_down_is_unknown() {
        let mut read = MockAgent::new();
        read.expect_get()
            .returning(|addresses| Ok(vec![VarBind::new(addresses[0].clone(), 3)]));
        read.expect_get_bulk().returning(|base, _| Ok(vec![VarBind::new(format!("{}.1", base), 5)]));

        let tx = Transmitter::new(
            Connection::shared("read", read),
            Connection::shared("write", SimulatedAgent::new()),
            &AddressTable::default(),
        )
        .unwrap();
        tx.update_state_and_status();

        assert_eq!(tx.state(), HealthState::Unknown);
        assert_eq!(tx.status(), "Transmitter: Data acquisition failed: expected 4 values, got 1");
    }

    #[test]
    fn test_refresh_reads_all_fields() {
        let agent = healthy_agent(&[1], &[1, 2]);
        let tx = transmitter(&agent);
        tx.update_read_parameters();

        assert!(tx.data_valid());
        assert_eq!(tx.forward_power(), 1000);
        assert_eq!(tx.reflected_power(), 12);
        assert_eq!(tx.pa_efficiency(), 64);
        assert_eq!(tx.switch_on(), 1);
        assert_eq!(tx.nominal_power(), 1000);
    }

    #[test]
    fn test_refresh_with_malformed_value_keeps_previous_values() {
        let agent = healthy_agent(&[1], &[1, 2]);
        let tx = transmitter(&agent);
        tx.update_read_parameters();
        assert!(tx.data_valid());

        // A malformed value anywhere leaves every field untouched
        agent.insert(&AddressTable::default().nominal_power, "n/a").unwrap();
        agent.insert(&AddressTable::default().trans_fp, 2000u32).unwrap();
        tx.update_read_parameters();
        assert!(!tx.data_valid());
        assert_eq!(tx.forward_power(), 1000);
        assert_eq!(tx.nominal_power(), 1000);
    }

    #[test]
    fn test_short_reply_keeps_every_previous_reading() {
        let mut read = MockAgent::new();
        let mut calls = 0;
        read.expect_get().returning(move |addresses| {
            calls += 1;
            let values: [Value; 5] = [
                Value::Unsigned(1000),
                Value::Unsigned(12),
                Value::Integer(64),
                Value::Integer(1),
                Value::Unsigned(900),
            ];
            let take = if calls == 1 { 5 } else { 4 };
            Ok(addresses
                .iter()
                .zip(values)
                .take(take)
                .map(|(address, value)| VarBind::new(address.clone(), value))
                .collect())
        });
        let tx = Transmitter::new(
            Connection::shared("read", read),
            Connection::shared("write", SimulatedAgent::new()),
            &AddressTable::default(),
        )
        .unwrap();

        tx.update_read_parameters();
        assert!(tx.data_valid());

        tx.update_read_parameters();
        assert!(!tx.data_valid());
        assert_eq!(tx.forward_power(), 1000);
        assert_eq!(tx.reflected_power(), 12);
        assert_eq!(tx.pa_efficiency(), 64);
        assert_eq!(tx.switch_on(), 1);
        assert_eq!(tx.nominal_power(), 900);
    }

    #[test]
    fn test_commands_go_through_write_connection() {
        let agent = healthy_agent(&[1], &[1, 2]);
        let addresses = AddressTable::default();
        let tx = transmitter(&agent);

        tx.reset().unwrap();
        tx.power_switch(PowerSwitch::Off).unwrap();
        tx.set_nominal_power(800).unwrap();

        assert_eq!(agent.value(&addresses.trans_reset), Some(Value::Integer(2)));
        assert_eq!(agent.value(&addresses.trans_on), Some(Value::Integer(2)));
        assert_eq!(agent.value(&addresses.nominal_power), Some(Value::Unsigned(800)));
        assert_eq!(agent.request_counts().set, 3);
    }

    #[test]
    fn test_write_failure_propagates() {
        let agent = healthy_agent(&[1], &[1, 2]);
        let tx = transmitter(&agent);
        agent.set_offline(true);
        assert!(matches!(tx.power_switch(PowerSwitch::On), Err(RfError::Protocol(_))));
    }
}
