use crate::aggregate::{decade_volume, total_volume};
use crate::calendar::{DecadeKey, Month, TableHalf};
use crate::config::EngineConfig;
use crate::error::{LossError, Result};
use crate::flows::FlowTable;
use crate::network::{NetworkTopology, SEGMENT_COUNT};
use crate::seepage::base_loss;
use crate::state::DecadeState;
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inflow, seepage loss and outflow of one segment in one decade (l/s).
/// Either all three are set or none is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossCalculationResult {
    pub q_in: Option<f64>,
    pub s: Option<f64>,
    pub q_out: Option<f64>,
}

impl LossCalculationResult {
    pub const UNSET: LossCalculationResult = LossCalculationResult {
        q_in: None,
        s: None,
        q_out: None,
    };

    pub fn computed(q_in: f64, s: f64) -> Self {
        LossCalculationResult {
            q_in: Some(q_in),
            s: Some(s),
            q_out: Some(q_in + s),
        }
    }

    pub fn is_set(&self) -> bool {
        self.q_in.is_some() && self.s.is_some() && self.q_out.is_some()
    }

    /// `(q_in, s, q_out)` when the triple is fully computed.
    pub fn values(&self) -> Option<(f64, f64, f64)> {
        Some((self.q_in?, self.s?, self.q_out?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecadeResult {
    /// Per segment, in routing order.
    pub segments: [LossCalculationResult; SEGMENT_COUNT],
    /// Total intake Qg, l/s.
    pub q_g: Option<f64>,
    /// Decade volume Wg, million m³.
    pub w_g: Option<f64>,
    /// Wg plus return flow, million m³.
    pub w_total: Option<f64>,
}

impl DecadeResult {
    pub fn unset() -> Self {
        DecadeResult {
            segments: [LossCalculationResult::UNSET; SEGMENT_COUNT],
            q_g: None,
            w_g: None,
            w_total: None,
        }
    }

    pub fn is_unset(&self) -> bool {
        self == &Self::unset()
    }
}

/// Result of a full pass over the season, one entry per decade in calendar
/// order. Decades that could not be computed hold [`DecadeResult::unset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatedTableResults {
    decades: BTreeMap<DecadeKey, DecadeResult>,
}

impl CalculatedTableResults {
    pub fn get(&self, key: DecadeKey) -> Option<&DecadeResult> {
        self.decades.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DecadeKey, &DecadeResult)> {
        self.decades.iter()
    }

    pub fn len(&self) -> usize {
        self.decades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decades.is_empty()
    }
}

impl FromIterator<(DecadeKey, DecadeResult)> for CalculatedTableResults {
    fn from_iter<I: IntoIterator<Item = (DecadeKey, DecadeResult)>>(iter: I) -> Self {
        CalculatedTableResults {
            decades: iter.into_iter().collect(),
        }
    }
}

/// Routes one decade down the chain. Each decade starts from its own measured
/// inputs; nothing carries over from the previous decade.
pub fn route_decade(
    topology: &NetworkTopology,
    table: &FlowTable,
    decade: DecadeKey,
    config: &EngineConfig,
) -> Result<DecadeResult> {
    let month = decade.month;
    let sources = topology.required_sources(month);

    let mut state = match DecadeState::load(table, decade, &sources)? {
        Ok(state) => state,
        Err(missing) => {
            warn!("{}: {} not measured, decade left unset", decade, missing);
            return Ok(DecadeResult::unset());
        }
    };

    let mut result = DecadeResult::unset();

    // Process each segment in routing order (MUST be serial, each feeds the next)
    for id in topology.evaluated(month) {
        let spec = topology
            .segments
            .get(id)
            .ok_or_else(|| LossError::InvalidTopology(format!("{} not in topology", id)))?;
        let position = topology
            .routing_order
            .iter()
            .position(|r| r == id)
            .filter(|&p| p < SEGMENT_COUNT)
            .ok_or_else(|| LossError::InvalidTopology(format!("{} not in routing order", id)))?;

        let q_in = state.inflow(&spec.inflow).ok_or_else(|| {
            LossError::InvalidTopology(format!("{} routed before its upstream segment", id))
        })?;
        let s = base_loss(q_in, spec.length_km, config.filtration_coefficient);
        let segment = LossCalculationResult::computed(q_in, s);

        state.update_flow(*id, q_in + s);
        result.segments[position] = segment;
    }

    if !month.is_dry_season_transition() {
        result.q_g = topology
            .outlet()
            .and_then(|outlet| state.outflows.get(&outlet).copied());
        result.w_g = decade_volume(result.q_g, config.days_per_decade);
        result.w_total = total_volume(result.w_g, config.return_flow_volume);
    }

    debug!(
        "{}: Qg={:?} Wg={:?} Wtotal={:?}",
        decade, result.q_g, result.w_g, result.w_total
    );
    Ok(result)
}

fn table_for<'a>(month: Month, part1: &'a FlowTable, part2: &'a FlowTable) -> &'a FlowTable {
    match month.table_half() {
        TableHalf::First => part1,
        TableHalf::Second => part2,
    }
}

fn check_sources(topology: &NetworkTopology, part1: &FlowTable, part2: &FlowTable) -> Result<()> {
    for month in Month::ALL {
        let table = table_for(month, part1, part2);
        for source in topology.required_sources(month) {
            table.source(source)?;
        }
    }
    Ok(())
}

/// Computes every decade of the season, spreading decades over a worker pool.
/// `part1` holds the April-June measurements, `part2` July-October.
pub fn calculate_table(
    topology: &NetworkTopology,
    part1: &FlowTable,
    part2: &FlowTable,
    config: &EngineConfig,
) -> Result<CalculatedTableResults> {
    config.validate()?;
    check_sources(topology, part1, part2)?;

    let decades: Vec<DecadeKey> = DecadeKey::season().collect();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads())
        .build()?;

    let routed: Vec<(DecadeKey, DecadeResult)> = pool.install(|| {
        decades
            .par_iter()
            .map(|&key| {
                let table = table_for(key.month, part1, part2);
                route_decade(topology, table, key, config).map(|result| (key, result))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    Ok(routed.into_iter().collect())
}

/// Single-threaded equivalent of [`calculate_table`].
pub fn calculate_table_sequential(
    topology: &NetworkTopology,
    part1: &FlowTable,
    part2: &FlowTable,
    config: &EngineConfig,
) -> Result<CalculatedTableResults> {
    config.validate()?;
    check_sources(topology, part1, part2)?;

    DecadeKey::season()
        .map(|key| {
            let table = table_for(key.month, part1, part2);
            route_decade(topology, table, key, config).map(|result| (key, result))
        })
        .collect()
}

/// The Rudaki chain with default engine parameters.
pub fn calculate_hydrology_table(part1: &FlowTable, part2: &FlowTable) -> Result<CalculatedTableResults> {
    let topology = NetworkTopology::rudaki()?;
    calculate_table(&topology, part1, part2, &EngineConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DecadeIndex;
    use crate::dataset::{table16_part1, table16_part2};
    use approx::assert_relative_eq;

    fn key(month: Month, decade: DecadeIndex) -> DecadeKey {
        DecadeKey::new(month, decade)
    }

    #[test]
    fn first_april_decade_matches_hand_calculation() {
        let table = calculate_hydrology_table(&table16_part1().unwrap(), &table16_part2().unwrap()).unwrap();
        let apr_i = table.get(key(Month::Apr, DecadeIndex::First)).unwrap();

        let (q_in, s, q_out) = apr_i.segments[0].values().unwrap();
        assert_relative_eq!(q_in, 1101.9, epsilon = 1e-9);
        assert_relative_eq!(s, 66.157_190_692, epsilon = 1e-6);
        assert_relative_eq!(q_out, 1168.057_190_692, epsilon = 1e-6);

        let (q_in2, _, _) = apr_i.segments[1].values().unwrap();
        assert_relative_eq!(q_in2, q_out + 154.9 + 57.6, epsilon = 1e-9);

        assert_relative_eq!(apr_i.q_g.unwrap(), 1763.633_184_117, epsilon = 1e-6);
        assert_relative_eq!(apr_i.w_g.unwrap(), 1.523_779_071, epsilon = 1e-8);
        assert_eq!(apr_i.w_total, apr_i.w_g);
    }

    #[test]
    fn outflow_is_inflow_plus_loss() {
        let table = calculate_hydrology_table(&table16_part1().unwrap(), &table16_part2().unwrap()).unwrap();
        for (_, decade) in table.iter() {
            for segment in &decade.segments {
                if let Some((q_in, s, q_out)) = segment.values() {
                    assert!(s >= 0.0);
                    assert_eq!(q_out, q_in + s);
                }
            }
        }
    }

    #[test]
    fn july_computes_head_segment_only() {
        let table = calculate_hydrology_table(&table16_part1().unwrap(), &table16_part2().unwrap()).unwrap();
        for k in Month::Jul.decades() {
            let r = table.get(k).unwrap();
            assert!(r.segments[0].is_set(), "{k}");
            assert!(r.segments[1..].iter().all(|s| *s == LossCalculationResult::UNSET));
            assert_eq!((r.q_g, r.w_g, r.w_total), (None, None, None));
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let topology = NetworkTopology::rudaki().unwrap();
        let (p1, p2) = (table16_part1().unwrap(), table16_part2().unwrap());
        let config = EngineConfig {
            threads: Some(3),
            return_flow_volume: 0.1,
            ..EngineConfig::default()
        };
        let parallel = calculate_table(&topology, &p1, &p2, &config).unwrap();
        let sequential = calculate_table_sequential(&topology, &p1, &p2, &config).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 20);
    }
}
