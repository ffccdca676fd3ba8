//! The subset of a computed table handed to the text-summarization client:
//! only fully computed values, in decade order.

use crate::calendar::Month;
use crate::network::SEGMENT_COUNT;
use crate::routing::CalculatedTableResults;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MONTHS: [Month; 3] = [Month::Aug, Month::Sep, Month::Oct];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentFlows {
    pub q_in: f64,
    pub s: f64,
    pub q_out: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub segments: [Vec<SegmentFlows>; SEGMENT_COUNT],
    pub q_g: Vec<f64>,
    pub w_g: Vec<f64>,
    pub w_total: Vec<f64>,
}

impl AnalysisPayload {
    pub fn from_table(table: &CalculatedTableResults, months: &[Month]) -> Self {
        let mut payload = AnalysisPayload::default();

        let decades = table.iter().filter(|(key, _)| months.contains(&key.month));
        for (_, result) in decades {
            for (rows, segment) in payload.segments.iter_mut().zip(&result.segments) {
                if let Some((q_in, s, q_out)) = segment.values() {
                    rows.push(SegmentFlows { q_in, s, q_out });
                }
            }
            payload.q_g.extend(result.q_g);
            payload.w_g.extend(result.w_g);
            payload.w_total.extend(result.w_total);
        }
        payload
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(Vec::is_empty) && self.q_g.is_empty()
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{table16_part1, table16_part2};
    use crate::routing::calculate_hydrology_table;

    fn table() -> CalculatedTableResults {
        calculate_hydrology_table(&table16_part1().unwrap(), &table16_part2().unwrap()).unwrap()
    }

    #[test]
    fn default_months_cover_eight_decades() {
        let payload = AnalysisPayload::from_table(&table(), &DEFAULT_MONTHS);
        for rows in &payload.segments {
            assert_eq!(rows.len(), 8);
        }
        assert_eq!(payload.q_g.len(), 8);
        assert_eq!(payload.w_total.len(), 8);
    }

    #[test]
    fn july_contributes_head_segment_only() {
        let payload = AnalysisPayload::from_table(&table(), &[Month::Jul]);
        assert_eq!(payload.segments[0].len(), 3);
        assert!(payload.segments[1..].iter().all(Vec::is_empty));
        assert!(payload.q_g.is_empty());
        assert!(!payload.is_empty());
    }

    #[test]
    fn serializes_to_json() {
        let payload = AnalysisPayload::from_table(&table(), &[Month::Oct]);
        let json = payload.to_json().unwrap();
        let back: AnalysisPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.segments[3].len(), 2);
        assert_eq!(back.w_g.len(), payload.w_g.len());
        for (a, b) in back.q_g.iter().zip(&payload.q_g) {
            approx::assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }
}
