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

//! Concrete site components
//!
//! - `amplifiers` - N amplifiers behind one templated summary address
//! - `liquid_cooling` - two cooling loops, worst loop wins
//! - `transmitter` - transmitter summary, power readings and commands
//! - `out_stage` - output stage summary and output power
//! - `rf_sensor` - RF link state and sensor calibration
//! - `mtx` - multiplexed transmitter controller

pub mod amplifiers;
pub mod liquid_cooling;
pub mod mtx;
pub mod out_stage;
pub mod rf_sensor;
pub mod transmitter;

pub use amplifiers::Amplifiers;
pub use liquid_cooling::LiquidCooling;
pub use mtx::Mtx;
pub use out_stage::OutStage;
pub use rf_sensor::RfSensor;
pub use transmitter::{PowerSwitch, Transmitter};
