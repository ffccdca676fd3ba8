//! Measured decade flow series of the canals feeding the chain.
//!
//! Values are in l/s. `None` means the decade was not measured and must never
//! be read as zero flow.

use crate::calendar::{DecadeKey, Month};
use crate::error::{LossError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A reference row the segment chain draws flow from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowSource {
    /// Inter-farm canal 1-MK measured at PK91+50.
    MainChannel,
    Tributary1,
    Tributary2,
    Tributary3,
    Tributary4,
}

impl FlowSource {
    /// Row number of the source in the published table.
    pub fn row_number(self) -> u32 {
        match self {
            FlowSource::MainChannel => 1,
            FlowSource::Tributary1 => 2,
            FlowSource::Tributary2 => 3,
            FlowSource::Tributary3 => 4,
            FlowSource::Tributary4 => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FlowSource::MainChannel => "1-MK",
            FlowSource::Tributary1 => "1-1K",
            FlowSource::Tributary2 => "1-2K",
            FlowSource::Tributary3 => "1-3K",
            FlowSource::Tributary4 => "1-4K",
        }
    }
}

impl fmt::Display for FlowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentFlowRow {
    pub number: u32,
    pub name: String,
    /// Irrigated area served, ha.
    pub area: f64,
    pub omega: Option<f64>,
    decades: BTreeMap<Month, Vec<Option<f64>>>,
}

impl SegmentFlowRow {
    /// Builds a row from per-month decade values. Each month must carry
    /// exactly its decade count; October may carry a third value only if it is
    /// unmeasured.
    pub fn new(
        number: u32,
        name: impl Into<String>,
        area: f64,
        omega: Option<f64>,
        decades: BTreeMap<Month, Vec<Option<f64>>>,
    ) -> Result<Self> {
        let mut normalized = BTreeMap::new();
        for month in Month::ALL {
            let mut values = decades.get(&month).cloned().unwrap_or_default();
            let expected = month.decade_count();
            if values.len() > expected && values[expected..].iter().all(Option::is_none) {
                values.truncate(expected);
            }
            if values.len() != expected {
                return Err(LossError::InvalidSeries {
                    number,
                    reason: format!("{} has {} decade values, expected {}", month, values.len(), expected),
                });
            }
            normalized.insert(month, values);
        }

        Ok(SegmentFlowRow {
            number,
            name: name.into(),
            area,
            omega,
            decades: normalized,
        })
    }

    /// Builds a row from values listed in season decade order (20 values).
    pub fn from_season(
        number: u32,
        name: impl Into<String>,
        area: f64,
        omega: Option<f64>,
        values: &[Option<f64>],
    ) -> Result<Self> {
        let expected = DecadeKey::season().count();
        if values.len() != expected {
            return Err(LossError::InvalidSeries {
                number,
                reason: format!("{} season values, expected {}", values.len(), expected),
            });
        }

        let mut decades: BTreeMap<Month, Vec<Option<f64>>> = BTreeMap::new();
        for (key, value) in DecadeKey::season().zip(values.iter().copied()) {
            decades.entry(key.month).or_default().push(value);
        }
        Self::new(number, name, area, omega, decades)
    }

    pub fn flow(&self, key: DecadeKey) -> Option<f64> {
        self.decades
            .get(&key.month)
            .and_then(|values| values.get(key.decade.index()))
            .copied()
            .flatten()
    }

    pub fn month(&self, month: Month) -> &[Option<f64>] {
        self.decades.get(&month).map(Vec::as_slice).unwrap_or_default()
    }
}

/// One half of the published reference table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowTable {
    pub rows: Vec<SegmentFlowRow>,
}

impl FlowTable {
    pub fn new(rows: Vec<SegmentFlowRow>) -> Self {
        FlowTable { rows }
    }

    pub fn row(&self, number: u32) -> Option<&SegmentFlowRow> {
        self.rows.iter().find(|row| row.number == number)
    }

    pub fn source(&self, source: FlowSource) -> Result<&SegmentFlowRow> {
        self.row(source.row_number()).ok_or(LossError::MissingRow {
            number: source.row_number(),
            name: source.label(),
        })
    }
}
