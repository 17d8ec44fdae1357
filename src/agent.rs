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

//! Boundary to the management agent transport
//!
//! The wire protocol lives outside this crate. The core only needs three
//! primitives from a transport: fetch an explicit list of addresses, walk a
//! number of successor addresses from a base, and write one value.

use std::fmt;

use rf_error::Result;
use serde::{Deserialize, Serialize};

/// A value returned by the agent for one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Integer(i32),
    Unsigned(u32),
    Text(String),
    /// The address names no object known to the agent
    NoSuchObject,
    /// The object exists but this instance does not
    NoSuchInstance,
    /// A walk ran past the last manageable address
    EndOfMibView,
}

impl Value {
    /// Addressing exceptions: the agent answered, but not with data
    pub fn is_addressing_error(&self) -> bool {
        matches!(self, Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Unsigned(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::NoSuchObject => f.write_str("noSuchObject"),
            Value::NoSuchInstance => f.write_str("noSuchInstance"),
            Value::EndOfMibView => f.write_str("endOfMibView"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Unsigned(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// An address paired with the value the agent returned for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub address: String,
    pub value: Value,
}

impl VarBind {
    pub fn new(address: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            address: address.into(),
            value: value.into(),
        }
    }
}

/// Payloads accepted by a write: text, signed or unsigned integers only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteValue {
    Text(String),
    Signed(i32),
    Unsigned(u32),
}

impl fmt::Display for WriteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteValue::Text(s) => f.write_str(s),
            WriteValue::Signed(v) => write!(f, "{}", v),
            WriteValue::Unsigned(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for WriteValue {
    fn from(v: &str) -> Self {
        WriteValue::Text(v.to_string())
    }
}

impl From<String> for WriteValue {
    fn from(v: String) -> Self {
        WriteValue::Text(v)
    }
}

impl From<i32> for WriteValue {
    fn from(v: i32) -> Self {
        WriteValue::Signed(v)
    }
}

impl From<u32> for WriteValue {
    fn from(v: u32) -> Self {
        WriteValue::Unsigned(v)
    }
}

impl From<WriteValue> for Value {
    fn from(v: WriteValue) -> Self {
        match v {
            WriteValue::Text(s) => Value::Text(s),
            WriteValue::Signed(v) => Value::Integer(v),
            WriteValue::Unsigned(v) => Value::Unsigned(v),
        }
    }
}

/// Transport primitives consumed by the request multiplexer.
///
/// Implementations own their timeout and retry policy. A transport failure is
/// reported as [`rf_error::RfError::Protocol`] carrying the transport's own
/// description; addressing exceptions are returned as values, not errors.
#[cfg_attr(test, mockall::automock)]
pub trait Agent: Send {
    /// Read every address in one round trip, in order
    fn get(&mut self, addresses: &[String]) -> Result<Vec<VarBind>>;

    /// Read `count` successive addresses following `base`
    fn get_bulk(&mut self, base: &str, count: u16) -> Result<Vec<VarBind>>;

    /// Write a single value
    fn set(&mut self, address: &str, value: &WriteValue) -> Result<()>;
}
