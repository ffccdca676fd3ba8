use crate::calendar::DecadeKey;
use crate::flows::{FlowSource, FlowTable};
use crate::network::{InflowRule, SegmentId};
use std::collections::HashMap;

// Propagation state for a single decade: measured inputs and the outflow of
// every segment routed so far
#[derive(Debug, Default)]
pub struct DecadeState {
    pub inputs: HashMap<FlowSource, f64>,
    pub outflows: HashMap<SegmentId, f64>,
}

impl DecadeState {
    /// Collects the measured flows for `decade`. Returns the first source that
    /// is unmeasured if any is, since the decade cannot then be computed.
    pub fn load(
        table: &FlowTable,
        decade: DecadeKey,
        sources: &[FlowSource],
    ) -> crate::error::Result<Result<Self, FlowSource>> {
        let mut state = DecadeState::default();
        for &source in sources {
            match table.source(source)?.flow(decade) {
                Some(q) => {
                    state.inputs.insert(source, q);
                }
                None => return Ok(Err(source)),
            }
        }
        Ok(Ok(state))
    }

    /// Upstream outflow plus tributary flows for a segment. Every input was
    /// checked in `load`, so a missing entry here is a routing-order bug.
    pub fn inflow(&self, rule: &InflowRule) -> Option<f64> {
        let upstream = match rule.upstream {
            Some(id) => *self.outflows.get(&id)?,
            None => 0.0,
        };
        rule.tributaries
            .iter()
            .map(|source| self.inputs.get(source).copied())
            .sum::<Option<f64>>()
            .map(|tributaries| upstream + tributaries)
    }

    pub fn update_flow(&mut self, id: SegmentId, outflow: f64) {
        self.outflows.insert(id, outflow);
    }
}
