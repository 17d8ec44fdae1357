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

//! Named, reusable requests against one agent connection
//!
//! A component describes each of its reads once, under a name, and then
//! executes it by name on every poll. Two request shapes exist: a plain GET
//! over an explicit address list, and a bulk walk of a fixed number of
//! successor addresses from a base address.
//!
//! [`RequestMultiplexer`] is not thread-safe and takes `&mut self`.
//! [`Connection`] puts one multiplexer behind a mutex so the components
//! sharing a connection can hold it through an `Arc`. Reads and writes use
//! separate connections so neither waits on the other.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rf_error::{Result, RfError};
use tracing::debug;

use crate::agent::{Agent, VarBind, WriteValue};

#[derive(Debug, Clone, PartialEq, Eq)]
enum RequestKind {
    Get(Vec<String>),
    Bulk { base: String, count: u16 },
}

#[derive(Debug)]
struct Request {
    kind: RequestKind,
    last_value_count: usize,
}

/// Registry of named requests bound to one agent
pub struct RequestMultiplexer {
    agent: Box<dyn Agent>,
    requests: HashMap<String, Request>,
}

impl RequestMultiplexer {
    pub fn new(agent: Box<dyn Agent>) -> Self {
        Self {
            agent,
            requests: HashMap::new(),
        }
    }

    /// Register a GET over an explicit, non-empty address list
    pub fn register(&mut self, name: &str, addresses: &[String]) -> Result<()> {
        if addresses.is_empty() {
            return Err(RfError::invalid_argument(format!(
                "At least 1 address needs to be specified for request {}",
                name
            )));
        }
        self.insert(name, RequestKind::Get(addresses.to_vec()))
    }

    /// Register a walk of `count` successor addresses starting after `base`
    pub fn register_bulk(&mut self, name: &str, base: &str, count: u16) -> Result<()> {
        if count == 0 {
            return Err(RfError::invalid_argument(format!(
                "Bulk request {} needs at least 1 element",
                name
            )));
        }
        self.insert(
            name,
            RequestKind::Bulk {
                base: base.to_string(),
                count,
            },
        )
    }

    fn insert(&mut self, name: &str, kind: RequestKind) -> Result<()> {
        match self.requests.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RfError::DuplicateName(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Request {
                    kind,
                    last_value_count: 0,
                });
                Ok(())
            }
        }
    }

    /// Execute a registered request and return its values as text, in order.
    ///
    /// With `ignore_addressing_errors` set, addressing exceptions come back as
    /// their printable marker. Otherwise any of them fails the whole request.
    pub fn execute(&mut self, name: &str, ignore_addressing_errors: bool) -> Result<Vec<String>> {
        let Self { agent, requests } = self;
        let request = requests
            .get_mut(name)
            .ok_or_else(|| RfError::UnknownRequest(name.to_string()))?;

        let bindings = match &request.kind {
            RequestKind::Get(addresses) => agent.get(addresses)?,
            RequestKind::Bulk { base, count } => agent.get_bulk(base, *count)?,
        };
        request.last_value_count = bindings.len();

        extract_values(bindings, ignore_addressing_errors)
    }

    pub fn unregister(&mut self, name: &str) -> Result<()> {
        self.requests
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RfError::UnknownRequest(name.to_string()))
    }

    /// Write one value to one address, outside any registered request
    pub fn set_value(&mut self, address: &str, value: impl Into<WriteValue>) -> Result<()> {
        self.agent.set(address, &value.into())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.requests.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Number of values the last execution of `name` bound
    pub fn last_value_count(&self, name: &str) -> Option<usize> {
        self.requests.get(name).map(|r| r.last_value_count)
    }
}

fn extract_values(bindings: Vec<VarBind>, ignore_addressing_errors: bool) -> Result<Vec<String>> {
    let mut errors = Vec::new();
    let values = bindings
        .into_iter()
        .map(|vb| {
            if !ignore_addressing_errors && vb.value.is_addressing_error() {
                errors.push(format!("On {} error occurred: {}", vb.address, vb.value));
            }
            vb.value.to_string()
        })
        .collect();

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(RfError::protocol(errors.join("\n")))
    }
}

/// One agent connection shared by the components that poll through it
pub struct Connection {
    label: String,
    inner: Mutex<RequestMultiplexer>,
}

impl Connection {
    pub fn new(label: impl Into<String>, agent: impl Agent + 'static) -> Self {
        Self {
            label: label.into(),
            inner: Mutex::new(RequestMultiplexer::new(Box::new(agent))),
        }
    }

    pub fn shared(label: impl Into<String>, agent: impl Agent + 'static) -> Arc<Self> {
        Arc::new(Self::new(label, agent))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn register(&self, name: &str, addresses: &[String]) -> Result<()> {
        debug!(connection = %self.label, request = name, addresses = addresses.len(), "register");
        self.inner.lock().register(name, addresses)
    }

    pub fn register_bulk(&self, name: &str, base: &str, count: u16) -> Result<()> {
        debug!(connection = %self.label, request = name, base, count, "register bulk");
        self.inner.lock().register_bulk(name, base, count)
    }

    pub fn execute(&self, name: &str, ignore_addressing_errors: bool) -> Result<Vec<String>> {
        let result = self.inner.lock().execute(name, ignore_addressing_errors);
        if let Err(e) = &result {
            debug!(connection = %self.label, request = name, error = %e, "execute failed");
        }
        result
    }

    pub fn unregister(&self, name: &str) -> Result<()> {
        debug!(connection = %self.label, request = name, "unregister");
        self.inner.lock().unregister(name)
    }

    pub fn set_value(&self, address: &str, value: impl Into<WriteValue>) -> Result<()> {
        let value = value.into();
        debug!(connection = %self.label, address, value = %value, "set");
        self.inner.lock().set_value(address, value)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.lock().is_registered(name)
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn last_value_count(&self, name: &str) -> Option<usize> {
        self.inner.lock().last_value_count(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{MockAgent, Value};
    use mockall::predicate::eq;

    fn addrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn echo_agent(value: i32) -> MockAgent {
        let mut agent = MockAgent::new();
        agent.expect_get().returning(move |addresses: &[String]| {
            Ok(addresses.iter().map(|a| VarBind::new(a.clone(), value)).collect())
        });
        agent
    }

    #[test]
    fn test_register_and_execute_in_order() {
        let mut mux = RequestMultiplexer::new(Box::new(echo_agent(5)));
        mux.register("summary", &addrs(&["1.1", "1.2", "1.3"])).unwrap();
        let values = mux.execute("summary", true).unwrap();
        assert_eq!(values, vec!["5", "5", "5"]);
        assert_eq!(mux.last_value_count("summary"), Some(3));
    }

    #[test]
    fn test_register_empty_list_fails() {
        let mut mux = RequestMultiplexer::new(Box::new(MockAgent::new()));
        let err = mux.register("empty", &[]).unwrap_err();
        assert!(matches!(err, RfError::InvalidArgument(_)));
        assert!(mux.is_empty());
    }

    #[test]
    fn test_register_bulk_zero_count_fails() {
        let mut mux = RequestMultiplexer::new(Box::new(MockAgent::new()));
        let err = mux.register_bulk("walk", "1.1", 0).unwrap_err();
        assert!(matches!(err, RfError::InvalidArgument(_)));
    }

    #[test]
    fn test_duplicate_name_fails() {
        let mut mux = RequestMultiplexer::new(Box::new(MockAgent::new()));
        mux.register("AMPs", &addrs(&["1.1"])).unwrap();
        let err = mux.register("AMPs", &addrs(&["1.2"])).unwrap_err();
        assert!(matches!(err, RfError::DuplicateName(name) if name == "AMPs"));

        let err = mux.register_bulk("AMPs", "1.1", 3).unwrap_err();
        assert!(matches!(err, RfError::DuplicateName(_)));
        assert_eq!(mux.len(), 1);
    }

    #[test]
    fn test_execute_unknown_fails() {
        let mut mux = RequestMultiplexer::new(Box::new(MockAgent::new()));
        let err = mux.execute("missing", true).unwrap_err();
        assert!(matches!(err, RfError::UnknownRequest(_)));
    }

    #[test]
    fn test_execute_after_unregister_fails() {
        let mut mux = RequestMultiplexer::new(Box::new(echo_agent(5)));
        mux.register("r", &addrs(&["1.1"])).unwrap();
        mux.unregister("r").unwrap();
        assert!(matches!(mux.execute("r", true), Err(RfError::UnknownRequest(_))));
        assert!(matches!(mux.unregister("r"), Err(RfError::UnknownRequest(_))));
    }

    #[test]
    fn test_bulk_executes_walk_with_count() {
        let mut agent = MockAgent::new();
        agent
            .expect_get_bulk()
            .with(eq("1.3.6.100"), eq(4u16))
            .times(2)
            .returning(|_, count| {
                Ok((1..=count)
                    .map(|i| VarBind::new(format!("1.3.6.{}", 100 + i), 5))
                    .collect())
            });
        let mut mux = RequestMultiplexer::new(Box::new(agent));
        mux.register_bulk("diag", "1.3.6.100", 4).unwrap();

        assert_eq!(mux.execute("diag", true).unwrap().len(), 4);
        assert_eq!(mux.execute("diag", true).unwrap().len(), 4);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let mut agent = MockAgent::new();
        agent
            .expect_get()
            .returning(|_| Err(RfError::protocol("No response from agent")));
        let mut mux = RequestMultiplexer::new(Box::new(agent));
        mux.register("r", &addrs(&["1.1"])).unwrap();

        let err = mux.execute("r", true).unwrap_err();
        assert!(matches!(err, RfError::Protocol(ref m) if m == "No response from agent"));
    }

    #[test]
    fn test_addressing_errors_tolerated_by_default() {
        let mut agent = MockAgent::new();
        agent.expect_get().returning(|_| {
            Ok(vec![
                VarBind::new("1.1", 5),
                VarBind::new("1.2", Value::NoSuchInstance),
            ])
        });
        let mut mux = RequestMultiplexer::new(Box::new(agent));
        mux.register("r", &addrs(&["1.1", "1.2"])).unwrap();

        let values = mux.execute("r", true).unwrap();
        assert_eq!(values, vec!["5", "noSuchInstance"]);
    }

    #[test]
    fn test_addressing_errors_fail_when_strict() {
        let mut agent = MockAgent::new();
        agent.expect_get().returning(|_| {
            Ok(vec![
                VarBind::new("1.1", Value::NoSuchObject),
                VarBind::new("1.2", 5),
                VarBind::new("1.3", Value::EndOfMibView),
            ])
        });
        let mut mux = RequestMultiplexer::new(Box::new(agent));
        mux.register("r", &addrs(&["1.1", "1.2", "1.3"])).unwrap();

        match mux.execute("r", false) {
            Err(RfError::Protocol(msg)) => {
                assert!(msg.contains("On 1.1 error occurred: noSuchObject"));
                assert!(msg.contains("On 1.3 error occurred: endOfMibView"));
                assert!(!msg.contains("1.2"));
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_set_value_passes_payload() {
        let mut agent = MockAgent::new();
        agent
            .expect_set()
            .with(eq("1.2.3"), eq(WriteValue::Signed(2)))
            .times(1)
            .returning(|_, _| Ok(()));
        agent
            .expect_set()
            .with(eq("1.2.4"), eq(WriteValue::Unsigned(900)))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut mux = RequestMultiplexer::new(Box::new(agent));
        mux.set_value("1.2.3", 2i32).unwrap();
        mux.set_value("1.2.4", 900u32).unwrap();
    }

    #[test]
    fn test_set_value_failure() {
        let mut agent = MockAgent::new();
        agent
            .expect_set()
            .returning(|_, _| Err(RfError::protocol("Timeout")));
        let mut mux = RequestMultiplexer::new(Box::new(agent));
        assert!(matches!(mux.set_value("1.2", "text"), Err(RfError::Protocol(_))));
    }

    #[test]
    fn test_connection_delegates() {
        let conn = Connection::shared("read", echo_agent(4));
        conn.register("s", &addrs(&["1.1", "1.2"])).unwrap();
        assert!(conn.is_registered("s"));
        assert_eq!(conn.request_count(), 1);
        assert_eq!(conn.execute("s", false).unwrap(), vec!["4", "4"]);
        conn.unregister("s").unwrap();
        assert_eq!(conn.request_count(), 0);
        assert_eq!(conn.label(), "read");
    }
}
