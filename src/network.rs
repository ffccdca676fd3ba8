use crate::calendar::Month;
use crate::error::{LossError, Result};
use crate::flows::FlowSource;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Number of segments in the Rudaki main-canal chain.
pub const SEGMENT_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u8);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment {}", self.0)
    }
}

/// Where a segment's inflow comes from: the outflow of at most one upstream
/// segment plus measured tributary flows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflowRule {
    pub upstream: Option<SegmentId>,
    pub tributaries: &'static [FlowSource],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpec {
    pub id: SegmentId,
    pub length_km: f64,
    pub inflow: InflowRule,
}

/// The canal chain downstream of PK91+50. A tributary may feed more than one
/// segment (1-3K joins at both segment 2 and segment 3).
pub const RUDAKI_CHAIN: [SegmentSpec; SEGMENT_COUNT] = [
    SegmentSpec {
        id: SegmentId(1),
        length_km: 3.030,
        inflow: InflowRule {
            upstream: None,
            tributaries: &[FlowSource::MainChannel, FlowSource::Tributary4],
        },
    },
    SegmentSpec {
        id: SegmentId(2),
        length_km: 6.020,
        inflow: InflowRule {
            upstream: Some(SegmentId(1)),
            tributaries: &[FlowSource::Tributary2, FlowSource::Tributary3],
        },
    },
    SegmentSpec {
        id: SegmentId(3),
        length_km: 6.030,
        inflow: InflowRule {
            upstream: Some(SegmentId(2)),
            tributaries: &[FlowSource::Tributary3],
        },
    },
    SegmentSpec {
        id: SegmentId(4),
        length_km: 0.744,
        inflow: InflowRule {
            upstream: Some(SegmentId(3)),
            tributaries: &[],
        },
    },
];

// Network topology
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    pub segments: HashMap<SegmentId, SegmentSpec>,
    pub routing_order: Vec<SegmentId>,
}

impl NetworkTopology {
    /// Builds and validates a chain topology. The segments must form a single
    /// unbranched chain of exactly [`SEGMENT_COUNT`] segments.
    pub fn from_specs(specs: &[SegmentSpec]) -> Result<Self> {
        if specs.len() != SEGMENT_COUNT {
            return Err(LossError::InvalidTopology(format!(
                "expected {} segments, found {}",
                SEGMENT_COUNT,
                specs.len()
            )));
        }

        let mut segments = HashMap::new();
        for spec in specs {
            if segments.insert(spec.id, *spec).is_some() {
                return Err(LossError::InvalidTopology(format!("duplicate {}", spec.id)));
            }
        }

        let mut topology = NetworkTopology {
            segments,
            routing_order: Vec::new(),
        };
        topology.topological_sort()?;
        Ok(topology)
    }

    pub fn rudaki() -> Result<Self> {
        Self::from_specs(&RUDAKI_CHAIN)
    }

    fn downstream_of(&self, id: SegmentId) -> Vec<SegmentId> {
        let mut downstream: Vec<_> = self
            .segments
            .values()
            .filter(|s| s.inflow.upstream == Some(id))
            .map(|s| s.id)
            .collect();
        downstream.sort();
        downstream
    }

    pub fn topological_sort(&mut self) -> Result<()> {
        let mut queue: VecDeque<SegmentId> = VecDeque::new();

        for spec in self.segments.values() {
            if let Some(upstream) = spec.inflow.upstream {
                if !self.segments.contains_key(&upstream) {
                    return Err(LossError::InvalidTopology(format!(
                        "{} draws from unknown {}",
                        spec.id, upstream
                    )));
                }
            }
        }

        // Find the head of the chain (no upstream segment)
        let mut heads: Vec<_> = self
            .segments
            .values()
            .filter(|s| s.inflow.upstream.is_none())
            .map(|s| s.id)
            .collect();
        heads.sort();
        match heads.as_slice() {
            [] => {
                return Err(LossError::InvalidTopology(
                    "No head segment found - possible cycle in chain".into(),
                ));
            }
            [head] => queue.push_back(*head),
            _ => {
                return Err(LossError::InvalidTopology(format!(
                    "chain must have a single head, found {:?}",
                    heads
                )));
            }
        }

        self.routing_order.clear();

        while let Some(current) = queue.pop_front() {
            self.routing_order.push(current);

            let downstream = self.downstream_of(current);
            if downstream.len() > 1 {
                return Err(LossError::InvalidTopology(format!(
                    "{} branches into {:?}",
                    current, downstream
                )));
            }
            queue.extend(downstream);
        }

        if self.routing_order.len() != self.segments.len() {
            return Err(LossError::InvalidTopology(format!(
                "Cycle detected in chain: processed {} segments out of {}",
                self.routing_order.len(),
                self.segments.len()
            )));
        }

        Ok(())
    }

    /// Specs in routing order.
    pub fn ordered(&self) -> impl Iterator<Item = &SegmentSpec> {
        self.routing_order.iter().filter_map(|id| self.segments.get(id))
    }

    /// The last segment, whose outflow is the total intake of the decade.
    pub fn outlet(&self) -> Option<SegmentId> {
        self.routing_order.last().copied()
    }

    /// Segments computed in a given month. During the dry-season transition
    /// only the head segment is evaluated; the rest of the chain stays unset.
    pub fn evaluated(&self, month: Month) -> &[SegmentId] {
        if month.is_dry_season_transition() {
            &self.routing_order[..self.routing_order.len().min(1)]
        } else {
            &self.routing_order
        }
    }

    /// Every measured source a month's evaluation depends on, without duplicates.
    pub fn required_sources(&self, month: Month) -> Vec<FlowSource> {
        let mut sources = Vec::new();
        for id in self.evaluated(month) {
            if let Some(spec) = self.segments.get(id) {
                for source in spec.inflow.tributaries {
                    if !sources.contains(source) {
                        sources.push(*source);
                    }
                }
            }
        }
        sources
    }
}
