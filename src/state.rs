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

//! Health state lattice
//!
//! Every subsystem reports one of six states. The ordinal doubles as a
//! severity rank (lower is worse) for the dual-loop rule, while the
//! multi-device rule uses an explicit severity over error states only:
//! `WARNING < FAULT < NOT_POSSIBLE < UNKNOWN`. `OFF` and `OK` never take part
//! in that comparison.

use std::fmt;

use rf_error::{Result, RfError};
use serde::{Deserialize, Serialize};

/// Subsystem health as reported by the management agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum HealthState {
    #[serde(rename = "DOES NOT EXIST")]
    NotPossible = 0,
    #[serde(rename = "UNKNOWN")]
    Unknown = 1,
    #[serde(rename = "OFF")]
    Off = 2,
    #[serde(rename = "FAULT")]
    Fault = 3,
    #[serde(rename = "WARNING")]
    Warning = 4,
    #[serde(rename = "OK")]
    Ok = 5,
}

impl HealthState {
    pub const ALL: [HealthState; 6] = [
        HealthState::NotPossible,
        HealthState::Unknown,
        HealthState::Off,
        HealthState::Fault,
        HealthState::Warning,
        HealthState::Ok,
    ];

    /// Raw value used on the wire
    pub const fn ordinal(self) -> i32 {
        self as i32
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.get(usize::try_from(raw).ok()?).copied()
    }

    /// Parse an agent value into a state, rejecting values outside the lattice
    pub fn parse(value: &str) -> Result<Self> {
        let raw = parse_raw(value)?;
        Self::from_raw(raw)
            .ok_or_else(|| RfError::protocol(format!("Value {} is not a valid state", raw)))
    }

    pub const fn text(self) -> &'static str {
        match self {
            HealthState::NotPossible => "DOES NOT EXIST",
            HealthState::Unknown => "UNKNOWN",
            HealthState::Off => "OFF",
            HealthState::Fault => "FAULT",
            HealthState::Warning => "WARNING",
            HealthState::Ok => "OK",
        }
    }

    /// Rank among error states, `None` for `OK` and `OFF`
    pub const fn severity(self) -> Option<u8> {
        match self {
            HealthState::Ok | HealthState::Off => None,
            HealthState::Warning => Some(1),
            HealthState::Fault => Some(2),
            HealthState::NotPossible => Some(3),
            HealthState::Unknown => Some(4),
        }
    }

    /// Whether `self` is strictly more severe than `other`
    pub fn is_worse_than(self, other: Self) -> bool {
        match (self.severity(), other.severity()) {
            (Some(a), Some(b)) => a > b,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Parse an agent value as a raw integer
pub fn parse_raw(value: &str) -> Result<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| RfError::protocol(format!("Failed to parse agent value '{}'", value.trim())))
}

/// Summary screening: a zero remainder against the `OK` ordinal needs no drill-down.
///
/// This lets `DOES NOT EXIST` (0) through as nominal, so an unpopulated slot
/// never triggers diagnosis on its own.
pub fn is_nominal_raw(raw: i32) -> bool {
    raw % HealthState::Ok.ordinal() == 0
}

/// Text of a diagnostic flag value
pub fn flag_text(value: &str) -> Result<&'static str> {
    HealthState::parse(value).map(HealthState::text)
}

/// Running aggregate over N devices of the same kind.
///
/// `OK` devices mark the group as on, `OFF` devices are informational, and
/// any other state replaces the worst seen so far only when strictly more
/// severe.
#[derive(Debug, Default, Clone)]
pub struct DeviceAggregate {
    worst: Option<HealthState>,
    any_on: bool,
}

impl DeviceAggregate {
    pub fn observe(&mut self, state: HealthState) {
        match state {
            HealthState::Ok => self.any_on = true,
            HealthState::Off => {}
            other => {
                if self.worst.map_or(true, |worst| other.is_worse_than(worst)) {
                    self.worst = Some(other);
                }
            }
        }
    }

    pub fn worst(&self) -> Option<HealthState> {
        self.worst
    }

    /// Worst error if any, else `OK` when at least one device was on, else `OFF`
    pub fn finish(&self) -> HealthState {
        match self.worst {
            Some(state) => state,
            None if self.any_on => HealthState::Ok,
            None => HealthState::Off,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_match_wire_values() {
        for (raw, state) in HealthState::ALL.iter().enumerate() {
            assert_eq!(state.ordinal(), raw as i32);
            assert_eq!(HealthState::from_raw(raw as i32), Some(*state));
        }
        assert_eq!(HealthState::from_raw(6), None);
        assert_eq!(HealthState::from_raw(-1), None);
    }

    #[test]
    fn test_parse_trims_and_validates() {
        assert_eq!(HealthState::parse(" 4 ").unwrap(), HealthState::Warning);
        assert!(matches!(HealthState::parse("9"), Err(RfError::Protocol(_))));
        assert!(matches!(HealthState::parse("abc"), Err(RfError::Protocol(_))));
    }

    #[test]
    fn test_text() {
        assert_eq!(HealthState::NotPossible.text(), "DOES NOT EXIST");
        assert_eq!(HealthState::Ok.to_string(), "OK");
        assert_eq!(flag_text("3").unwrap(), "FAULT");
    }

    #[test]
    fn test_ordinal_order_lower_is_worse() {
        assert!(HealthState::Fault < HealthState::Ok);
        assert_eq!(HealthState::Ok.min(HealthState::Fault), HealthState::Fault);
        assert_eq!(HealthState::Warning.min(HealthState::Ok), HealthState::Warning);
        assert_eq!(HealthState::Ok.min(HealthState::Off), HealthState::Off);
    }

    #[test]
    fn test_nominal_remainder_rule() {
        assert!(is_nominal_raw(5));
        assert!(is_nominal_raw(0));
        assert!(!is_nominal_raw(2));
        assert!(!is_nominal_raw(4));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(HealthState::Fault.is_worse_than(HealthState::Warning));
        assert!(HealthState::Unknown.is_worse_than(HealthState::Fault));
        assert!(!HealthState::Warning.is_worse_than(HealthState::Fault));
        assert!(!HealthState::Fault.is_worse_than(HealthState::Fault));
        assert!(!HealthState::Off.is_worse_than(HealthState::Ok));
    }

    #[test]
    fn test_aggregate_all_ok() {
        let mut agg = DeviceAggregate::default();
        for _ in 0..3 {
            agg.observe(HealthState::Ok);
        }
        assert_eq!(agg.finish(), HealthState::Ok);
    }

    #[test]
    fn test_aggregate_all_off() {
        let mut agg = DeviceAggregate::default();
        agg.observe(HealthState::Off);
        agg.observe(HealthState::Off);
        assert_eq!(agg.finish(), HealthState::Off);
    }

    #[test]
    fn test_aggregate_ok_and_off_is_ok() {
        let mut agg = DeviceAggregate::default();
        agg.observe(HealthState::Ok);
        agg.observe(HealthState::Off);
        agg.observe(HealthState::Ok);
        assert_eq!(agg.finish(), HealthState::Ok);
    }

    #[test]
    fn test_aggregate_stricter_wins_in_any_order() {
        let mut agg = DeviceAggregate::default();
        agg.observe(HealthState::Warning);
        agg.observe(HealthState::Fault);
        assert_eq!(agg.finish(), HealthState::Fault);

        let mut agg = DeviceAggregate::default();
        agg.observe(HealthState::Fault);
        agg.observe(HealthState::Warning);
        agg.observe(HealthState::Off);
        assert_eq!(agg.finish(), HealthState::Fault);
    }

    #[test]
    fn test_aggregate_unknown_dominates() {
        let mut agg = DeviceAggregate::default();
        agg.observe(HealthState::Unknown);
        agg.observe(HealthState::Fault);
        agg.observe(HealthState::NotPossible);
        assert_eq!(agg.finish(), HealthState::Unknown);
    }

    #[test]
    fn test_serializes_as_text() {
        assert_eq!(serde_json::to_string(&HealthState::NotPossible).unwrap(), "\"DOES NOT EXIST\"");
        assert_eq!(serde_json::to_string(&HealthState::Warning).unwrap(), "\"WARNING\"");
    }
}
