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

//! Component abstraction shared by every monitored subsystem
//!
//! A component owns a `{state, status}` pair guarded by one lock, a lock-free
//! data-valid flag, and the requests it registered at construction. Numeric
//! readings live in the concrete components as independent atomics.
//!
//! Poll-cycle failures never escape: they become `UNKNOWN` with the failure
//! text as status, or `data_valid = false` for readings.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rf_error::{Result, RfError};
use tracing::{debug, error, warn};

use crate::multiplexer::Connection;
use crate::state::{flag_text, is_nominal_raw, parse_raw, HealthState};

/// Requests a component registered on its read connection.
///
/// Everything registered through this guard is unregistered when it drops,
/// so a construction that fails half way leaves nothing behind, and a
/// component cleans up its requests when it is dropped.
pub struct Registrations {
    connection: Arc<Connection>,
    names: Vec<String>,
}

impl Registrations {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self {
            connection,
            names: Vec::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, addresses: &[String]) -> Result<()> {
        let name = name.into();
        self.connection.register(&name, addresses)?;
        self.names.push(name);
        Ok(())
    }

    pub fn register_bulk(&mut self, name: impl Into<String>, base: &str, count: u16) -> Result<()> {
        let name = name.into();
        self.connection.register_bulk(&name, base, count)?;
        self.names.push(name);
        Ok(())
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Drop for Registrations {
    fn drop(&mut self) {
        for name in self.names.iter().rev() {
            if let Err(e) = self.connection.unregister(name) {
                debug!(request = %name, error = %e, "unregister at teardown");
            }
        }
    }
}

#[derive(Debug)]
struct StateRecord {
    state: HealthState,
    status: String,
}

/// Name, state/status record and registrations common to all components
pub struct ComponentCore {
    name: String,
    summary_count: usize,
    record: Mutex<StateRecord>,
    data_valid: AtomicBool,
    registrations: Registrations,
}

impl ComponentCore {
    /// `registrations` must already hold the summary request, registered
    /// under the component name over `summary_count` addresses.
    pub fn new(name: impl Into<String>, summary_count: usize, registrations: Registrations) -> Self {
        let name = name.into();
        Self {
            record: Mutex::new(StateRecord {
                state: HealthState::Unknown,
                status: format!("{}: {}", name, HealthState::Unknown),
            }),
            name,
            summary_count,
            data_valid: AtomicBool::new(false),
            registrations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &Arc<Connection> {
        self.registrations.connection()
    }

    pub fn request_names(&self) -> &[String] {
        self.registrations.names()
    }

    /// Execute one of this component's requests, tolerating addressing errors
    pub fn execute(&self, request: &str) -> Result<Vec<String>> {
        self.connection().execute(request, true)
    }

    /// Replace state and status together; status is prefixed with the name
    pub fn set_state_and_status(&self, state: HealthState, status: &str) {
        let mut record = self.record.lock();
        record.state = state;
        record.status = format!("{}: {}", self.name, status);
    }

    /// Record a poll failure as `UNKNOWN` carrying the failure description
    pub fn record_failure(&self, err: &RfError) {
        warn!(component = %self.name, error = %err, "poll failed");
        self.set_state_and_status(HealthState::Unknown, &err.to_string());
    }

    pub fn state(&self) -> HealthState {
        self.record.lock().state
    }

    pub fn status(&self) -> String {
        self.record.lock().status.clone()
    }

    /// Consistent snapshot of both fields
    pub fn state_and_status(&self) -> (HealthState, String) {
        let record = self.record.lock();
        (record.state, record.status.clone())
    }

    pub fn data_valid(&self) -> bool {
        self.data_valid.load(Ordering::SeqCst)
    }

    pub fn set_data_valid(&self, valid: bool) {
        self.data_valid.store(valid, Ordering::SeqCst);
    }

    /// Read the summary request and check its shape
    pub fn read_summary(&self) -> Result<Vec<String>> {
        let values = self.execute(&self.name)?;
        expect_count(&values, self.summary_count)?;
        Ok(values)
    }

    /// Generic recompute: all nominal means `OK`, anything else goes to `diagnose`
    pub fn update_state_and_status<F>(&self, diagnose: F)
    where
        F: FnOnce(&[String]) -> Result<()>,
    {
        let values = match self.read_summary() {
            Ok(values) => values,
            Err(e) => return self.record_failure(&e),
        };

        for value in &values {
            match parse_raw(value) {
                Ok(raw) if is_nominal_raw(raw) => continue,
                Ok(_) => {
                    debug!(component = %self.name, ?values, "summary not nominal, diagnosing");
                    if let Err(e) = diagnose(&values) {
                        self.record_failure(&e);
                    }
                    return;
                }
                Err(e) => return self.record_failure(&e),
            }
        }

        self.set_state_and_status(HealthState::Ok, HealthState::Ok.text());
    }

    /// Map a single summary value straight onto the state, with its text as status
    pub fn update_raw_state(&self) {
        match self
            .read_summary()
            .and_then(|values| HealthState::parse(&values[0]))
        {
            Ok(state) => self.set_state_and_status(state, state.text()),
            Err(e) => self.record_failure(&e),
        }
    }

    /// Drill-down for single-summary components: the summary value is the
    /// state and the flags read through `request` make up the status.
    pub fn diagnose_flags(&self, summary_values: &[String], request: &str, labels: &[&str]) {
        let outcome = expect_count(summary_values, 1)
            .and_then(|_| HealthState::parse(&summary_values[0]))
            .and_then(|state| {
                let values = self.execute(request)?;
                Ok((state, describe_flags(labels, &values)?))
            });
        match outcome {
            Ok((state, detail)) => {
                self.set_state_and_status(state, &format!("detailed status:\n{}", detail))
            }
            Err(e) => self.record_failure(&e),
        }
    }
}

/// Common contract of every monitored subsystem
pub trait Component: Send + Sync {
    fn core(&self) -> &ComponentCore;

    /// Drill into a non-nominal summary and set the final state and status.
    ///
    /// Failures of the extra reads are recorded in the status, not returned.
    /// An error return means the operation itself is not available.
    fn diagnose(&self, summary_values: &[String]) -> Result<()>;

    /// Read and store the numeric readings, all of them or none
    fn refresh_readings(&self) -> Result<()>;

    fn update_state_and_status(&self) {
        self.core()
            .update_state_and_status(|values| self.diagnose(values));
    }

    /// Refresh readings and record the outcome in the data-valid flag
    fn update_read_parameters(&self) {
        let core = self.core();
        match self.refresh_readings() {
            Ok(()) => core.set_data_valid(true),
            Err(e) => {
                core.set_data_valid(false);
                if e.is_poll_failure() {
                    warn!(component = %core.name(), error = %e, "readings refresh failed");
                } else {
                    error!(component = %core.name(), error = %e, "readings refresh misconfigured");
                }
            }
        }
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn state(&self) -> HealthState {
        self.core().state()
    }

    fn status(&self) -> String {
        self.core().status()
    }

    fn state_and_status(&self) -> (HealthState, String) {
        self.core().state_and_status()
    }

    fn data_valid(&self) -> bool {
        self.core().data_valid()
    }
}

/// Fail with `DataAcquisitionFailed` unless exactly `expected` values arrived
pub fn expect_count(values: &[String], expected: usize) -> Result<()> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(RfError::count_mismatch(expected, values.len()))
    }
}

/// Parse one agent value as a numeric reading
pub fn parse_value<T: FromStr>(value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| RfError::protocol(format!("Failed to parse agent value '{}'", value.trim())))
}

/// Parse every value before any is stored
pub fn parse_all<T: FromStr>(values: &[String]) -> Result<Vec<T>> {
    values.iter().map(|v| parse_value(v)).collect()
}

/// Render drill-down flags as `label: STATE` lines
pub fn describe_flags(labels: &[&str], values: &[String]) -> Result<String> {
    expect_count(values, labels.len())?;
    let lines = labels
        .iter()
        .zip(values)
        .map(|(label, value)| Ok(format!("{}: {}", label, flag_text(value)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedAgent;

    struct Probe {
        core: ComponentCore,
        diagnosed: Mutex<Vec<Vec<String>>>,
    }

    impl Probe {
        fn new(connection: Arc<Connection>, summary: &[String]) -> Result<Self> {
            let mut registrations = Registrations::new(connection);
            registrations.register("probe", summary)?;
            Ok(Self {
                core: ComponentCore::new("probe", summary.len(), registrations),
                diagnosed: Mutex::new(Vec::new()),
            })
        }
    }

    impl Component for Probe {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn diagnose(&self, summary_values: &[String]) -> Result<()> {
            self.diagnosed.lock().push(summary_values.to_vec());
            self.core.set_state_and_status(HealthState::Warning, "diagnosed");
            Ok(())
        }

        fn refresh_readings(&self) -> Result<()> {
            Err(RfError::count_mismatch(2, 1))
        }
    }

    fn setup(values: &[i32]) -> (SimulatedAgent, Arc<Connection>, Vec<String>) {
        let agent = SimulatedAgent::new();
        let addresses: Vec<String> = (1..=values.len()).map(|i| format!("1.3.{}", i)).collect();
        for (address, value) in addresses.iter().zip(values) {
            agent.insert(address, *value).unwrap();
        }
        let connection = Connection::shared("test", agent.clone());
        (agent, connection, addresses)
    }

    #[test]
    fn test_initial_state_is_unknown() {
        let (_agent, conn, addresses) = setup(&[5]);
        let probe = Probe::new(conn, &addresses).unwrap();
        assert_eq!(probe.state(), HealthState::Unknown);
        assert!(probe.status().starts_with("probe: "));
        assert!(!probe.data_valid());
    }

    #[test]
    fn test_all_nominal_sets_ok_without_diagnose() {
        let (_agent, conn, addresses) = setup(&[5, 5, 0]);
        let probe = Probe::new(conn, &addresses).unwrap();
        probe.update_state_and_status();
        assert_eq!(probe.state_and_status(), (HealthState::Ok, "probe: OK".to_string()));
        assert!(probe.diagnosed.lock().is_empty());
    }

    #[test]
    fn test_non_nominal_hands_all_values_to_diagnose() {
        let (_agent, conn, addresses) = setup(&[5, 3]);
        let probe = Probe::new(conn, &addresses).unwrap();
        probe.update_state_and_status();
        assert_eq!(probe.state(), HealthState::Warning);
        assert_eq!(*probe.diagnosed.lock(), vec![vec!["5".to_string(), "3".to_string()]]);
    }

    #[test]
    fn test_transport_failure_sets_unknown_with_description() {
        let (agent, conn, addresses) = setup(&[5]);
        let probe = Probe::new(conn, &addresses).unwrap();
        probe.update_state_and_status();
        agent.set_offline(true);
        probe.update_state_and_status();
        assert_eq!(probe.state(), HealthState::Unknown);
        assert_eq!(probe.status(), "probe: No response from agent");
    }

    #[test]
    fn test_unparsable_summary_sets_unknown() {
        let (agent, conn, addresses) = setup(&[5]);
        agent.insert(&addresses[0], "garbage").unwrap();
        let probe = Probe::new(conn, &addresses).unwrap();
        probe.update_state_and_status();
        assert_eq!(probe.state(), HealthState::Unknown);
        assert!(probe.status().contains("garbage"));
    }

    #[test]
    fn test_refresh_failure_clears_data_valid() {
        let (_agent, conn, addresses) = setup(&[5]);
        let probe = Probe::new(conn, &addresses).unwrap();
        probe.core.set_data_valid(true);
        probe.update_read_parameters();
        assert!(!probe.data_valid());
    }

    #[test]
    fn test_drop_unregisters_requests() {
        let (_agent, conn, addresses) = setup(&[5]);
        let probe = Probe::new(conn.clone(), &addresses).unwrap();
        assert!(conn.is_registered("probe"));
        drop(probe);
        assert_eq!(conn.request_count(), 0);
    }

    #[test]
    fn test_failed_registration_rolls_back() {
        let (_agent, conn, addresses) = setup(&[5]);
        {
            let mut registrations = Registrations::new(conn.clone());
            registrations.register("a", &addresses).unwrap();
            registrations.register_bulk("b", &addresses[0], 2).unwrap();
            assert!(registrations.register("a", &addresses).is_err());
        }
        assert_eq!(conn.request_count(), 0);
    }

    #[test]
    fn test_describe_flags() {
        let values = vec!["5".to_string(), "3".to_string()];
        let text = describe_flags(&["first", "second"], &values).unwrap();
        assert_eq!(text, "first: OK\nsecond: FAULT");
        assert!(matches!(
            describe_flags(&["only"], &values),
            Err(RfError::DataAcquisitionFailed(_))
        ));
    }

    #[test]
    fn test_parse_all_is_all_or_nothing() {
        let values = vec!["1".to_string(), "x".to_string()];
        assert!(parse_all::<u32>(&values).is_err());
        assert_eq!(parse_all::<i32>(&["-4".to_string()]).unwrap(), vec![-4]);
    }
}
