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

//! Constants and default values for rfsite
//!
//! Centralizes vendor addressing, device counts and protocol magic numbers.
//! Components never reach for these directly: the address table is loaded
//! into a [`crate::address::AddressTable`] and injected at construction.

/// Placeholder replaced by a device index in parametric addresses
pub const INDEX_MARKER: char = 'X';

/// Vendor firmware address table (transmitter management agent)
pub mod addresses {
    /// Amplifier summary, one per amplifier index
    pub const AMP_SUMMARY: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.10.1.1.8.1.1.X.10000";
    /// Liquid cooling summary, one per cooling loop index
    pub const LQC_SUMMARY: &str = "1.3.6.1.4.1.2566.127.1.2.216.100.1.1.1.1.6.X.1";
    pub const TRANS_SUMMARY: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.1.1.1.6.1.1";
    pub const MTX_SUMMARY: &str = "1.3.6.1.4.1.2566.127.1.2.216.4.1.1.1.5.100";
    pub const OSTAGE_SUMMARY: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.9.1.1.7.1.1.9000";
    pub const RF_LINK: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.13.1.1.7.1.1.12000";
    pub const TRANS_RESET: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.1.2.1.1.1";
    pub const MTX_RESET: &str = "1.3.6.1.4.1.2566.127.1.2.216.4.1.4.2.1.0";
    pub const NOMINAL_POWER: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.1.2.1.3.1";
    pub const TRANS_FP: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.1.3.1.1.1";
    pub const TRANS_RP: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.1.3.1.2.1";
    pub const TRANS_PAE: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.1.3.1.6.1";
    pub const OUT_POWER: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.9.3.1.1.1.1";
    pub const RFS_FORWARD: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.13.2.1.14.1.1";
    pub const RFS_REFLECTED: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.13.2.1.15.1.1";
    pub const TRANS_ON: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.1.2.1.2.1";
    /// Amplifier output switch, one per amplifier index
    pub const AMP_ON: &str = "1.3.6.1.4.1.2566.127.1.2.216.3.1.10.1.1.8.1.1.X.10016";
    /// Cooling loop inlet temperature, one per cooling loop index
    pub const LQ_TIN: &str = "1.3.6.1.4.1.2566.127.1.2.216.100.1.1.2.1.2.X";
    /// Cooling loop outlet temperature, one per cooling loop index
    pub const LQ_TOUT: &str = "1.3.6.1.4.1.2566.127.1.2.216.100.1.1.2.1.5.X";
}

/// Device counts and drill-down block sizes
pub mod devices {
    /// Amplifiers installed in the output stage
    pub const AMPLIFIERS: usize = 12;
    /// Liquid cooling loops
    pub const COOLING_LOOPS: usize = 2;

    /// Diagnostic flags following each amplifier summary
    pub const AMP_DIAG_NODES: u16 = 15;
    /// Diagnostic flags following each cooling loop summary
    pub const LQC_DIAG_NODES: u16 = 4;
    /// Diagnostic flags following the transmitter summary
    pub const TRANS_DIAG_NODES: u16 = 4;
    /// Only the calibration flag follows the RF link state
    pub const RFS_DIAG_NODES: u16 = 1;
}

/// Values written to command addresses
pub mod commands {
    /// Writing this to a reset address triggers the reset
    pub const RESET_VALUE: i32 = 2;
    pub const SWITCH_ON: i32 = 1;
    pub const SWITCH_OFF: i32 = 2;
}

/// Transport defaults handed to the agent collaborator
pub mod agent {
    pub const DEFAULT_HOST: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 161;
    pub const DEFAULT_COMMUNITY: &str = "public";
    pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
    pub const DEFAULT_RETRIES: u16 = 1;

    /// Description returned by an agent that does not answer
    pub const NO_RESPONSE: &str = "No response from agent";
}

/// Polling cadence
pub mod polling {
    pub const DEFAULT_INTERVAL_MS: u64 = 1000;
    /// Anything faster overloads the management agent
    pub const MIN_INTERVAL_MS: u64 = 100;
}

/// Configuration locations
pub mod paths {
    pub const CONFIG_ENV: &str = "RFSITE_CONFIG";
    pub const CONFIG_FILE: &str = "/etc/rfsite/site.json";
}
