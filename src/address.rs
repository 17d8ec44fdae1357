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

//! Address templating and the site address table
//!
//! Homogeneous devices (amplifiers, cooling loops) are addressed through a
//! parametric address carrying one [`INDEX_MARKER`]. Expanding the template
//! with a list of device indices yields one concrete address per device.

use std::fmt::{self, Write};

use rf_error::{Result, RfError};
use serde::{Deserialize, Serialize};

use crate::constants::{addresses, INDEX_MARKER};

/// Expand a parametric address into one concrete address per index.
///
/// The single marker is replaced by the decimal text of each index; the rest
/// of the template is copied verbatim. Output order follows `indices`.
pub fn expand_template<T: fmt::Display>(template: &str, indices: &[T]) -> Result<Vec<String>> {
    let pos = marker_position(template)?;
    let head = &template[..pos];
    let tail = &template[pos + INDEX_MARKER.len_utf8()..];

    indices
        .iter()
        .map(|index| {
            let mut address = String::with_capacity(template.len() + 4);
            address.push_str(head);
            write!(address, "{}", index).map_err(|_| {
                RfError::InvalidIndex(format!("failed to render index for {}", template))
            })?;
            if address.len() == head.len() {
                return Err(RfError::InvalidIndex(format!(
                    "index renders to empty text for {}",
                    template
                )));
            }
            address.push_str(tail);
            Ok(address)
        })
        .collect()
}

/// Whether an address carries an index marker
pub fn is_template(address: &str) -> bool {
    address.contains(INDEX_MARKER)
}

fn marker_position(template: &str) -> Result<usize> {
    let mut markers = template.match_indices(INDEX_MARKER).map(|(pos, _)| pos);
    let pos = markers
        .next_back()
        .ok_or_else(|| RfError::InvalidTemplate(format!("no index marker in {}", template)))?;
    if markers.next().is_some() {
        return Err(RfError::InvalidTemplate(format!(
            "more than one index marker in {}",
            template
        )));
    }
    Ok(pos)
}

/// Every address the monitoring core uses, overridable per deployment.
///
/// Missing fields fall back to the vendor firmware table in
/// [`crate::constants::addresses`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddressTable {
    pub amp_summary: String,
    pub lqc_summary: String,
    pub trans_summary: String,
    pub mtx_summary: String,
    pub ostage_summary: String,
    pub rf_link: String,
    pub trans_reset: String,
    pub mtx_reset: String,
    pub nominal_power: String,
    pub trans_fp: String,
    pub trans_rp: String,
    pub trans_pae: String,
    pub out_power: String,
    pub rfs_forward: String,
    pub rfs_reflected: String,
    pub trans_on: String,
    pub amp_on: String,
    pub lq_tin: String,
    pub lq_tout: String,
}

impl Default for AddressTable {
    fn default() -> Self {
        Self {
            amp_summary: addresses::AMP_SUMMARY.into(),
            lqc_summary: addresses::LQC_SUMMARY.into(),
            trans_summary: addresses::TRANS_SUMMARY.into(),
            mtx_summary: addresses::MTX_SUMMARY.into(),
            ostage_summary: addresses::OSTAGE_SUMMARY.into(),
            rf_link: addresses::RF_LINK.into(),
            trans_reset: addresses::TRANS_RESET.into(),
            mtx_reset: addresses::MTX_RESET.into(),
            nominal_power: addresses::NOMINAL_POWER.into(),
            trans_fp: addresses::TRANS_FP.into(),
            trans_rp: addresses::TRANS_RP.into(),
            trans_pae: addresses::TRANS_PAE.into(),
            out_power: addresses::OUT_POWER.into(),
            rfs_forward: addresses::RFS_FORWARD.into(),
            rfs_reflected: addresses::RFS_REFLECTED.into(),
            trans_on: addresses::TRANS_ON.into(),
            amp_on: addresses::AMP_ON.into(),
            lq_tin: addresses::LQ_TIN.into(),
            lq_tout: addresses::LQ_TOUT.into(),
        }
    }
}

impl AddressTable {
    /// (field name, address, parametric)
    fn entries(&self) -> [(&'static str, &str, bool); 19] {
        [
            ("amp_summary", &self.amp_summary, true),
            ("lqc_summary", &self.lqc_summary, true),
            ("trans_summary", &self.trans_summary, false),
            ("mtx_summary", &self.mtx_summary, false),
            ("ostage_summary", &self.ostage_summary, false),
            ("rf_link", &self.rf_link, false),
            ("trans_reset", &self.trans_reset, false),
            ("mtx_reset", &self.mtx_reset, false),
            ("nominal_power", &self.nominal_power, false),
            ("trans_fp", &self.trans_fp, false),
            ("trans_rp", &self.trans_rp, false),
            ("trans_pae", &self.trans_pae, false),
            ("out_power", &self.out_power, false),
            ("rfs_forward", &self.rfs_forward, false),
            ("rfs_reflected", &self.rfs_reflected, false),
            ("trans_on", &self.trans_on, false),
            ("amp_on", &self.amp_on, true),
            ("lq_tin", &self.lq_tin, true),
            ("lq_tout", &self.lq_tout, true),
        ]
    }

    /// Check that parametric addresses carry exactly one marker and that
    /// every other address carries none.
    pub fn validate(&self) -> Result<()> {
        for (field, address, parametric) in self.entries() {
            if address.trim().is_empty() {
                return Err(RfError::config(format!("address {} is empty", field)));
            }
            if parametric {
                marker_position(address).map_err(|e| {
                    RfError::config(format!("address {}: {}", field, e))
                })?;
            } else if is_template(address) {
                return Err(RfError::config(format!(
                    "address {} must not contain an index marker",
                    field
                )));
            }
        }
        Ok(())
    }
}
