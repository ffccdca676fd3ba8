use crate::calendar::DecadeKey;
use crate::network::SEGMENT_COUNT;
use crate::routing::CalculatedTableResults;
use serde::Serialize;

// One line of the tabular result output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub decade: DecadeKey,
    pub row: String,
    pub q_in: Option<f64>,
    pub s: Option<f64>,
    pub q_out: Option<f64>,
    pub value: Option<f64>,
}

/// Four segment lines then Qg, Wg and Wtotal for every decade.
pub fn flatten(table: &CalculatedTableResults) -> Vec<ResultRow> {
    let mut rows = Vec::with_capacity(table.len() * (SEGMENT_COUNT + 3));
    for (&decade, result) in table.iter() {
        for (i, segment) in result.segments.iter().enumerate() {
            rows.push(ResultRow {
                decade,
                row: format!("segment_{}", i + 1),
                q_in: segment.q_in,
                s: segment.s,
                q_out: segment.q_out,
                value: None,
            });
        }
        for (label, value) in [("q_g", result.q_g), ("w_g", result.w_g), ("w_total", result.w_total)] {
            rows.push(ResultRow {
                decade,
                row: label.to_string(),
                q_in: None,
                s: None,
                q_out: None,
                value,
            });
        }
    }
    rows
}

// Column-oriented view of a result table for array writers
#[derive(Debug)]
pub struct TableSeries {
    pub decades: Vec<DecadeKey>,
    pub q_in: Vec<Vec<Option<f64>>>,
    pub s: Vec<Vec<Option<f64>>>,
    pub q_out: Vec<Vec<Option<f64>>>,
    pub q_g: Vec<Option<f64>>,
    pub w_g: Vec<Option<f64>>,
    pub w_total: Vec<Option<f64>>,
}

impl TableSeries {
    pub fn new(table: &CalculatedTableResults) -> Self {
        let mut series = TableSeries {
            decades: Vec::with_capacity(table.len()),
            q_in: vec![Vec::with_capacity(table.len()); SEGMENT_COUNT],
            s: vec![Vec::with_capacity(table.len()); SEGMENT_COUNT],
            q_out: vec![Vec::with_capacity(table.len()); SEGMENT_COUNT],
            q_g: Vec::with_capacity(table.len()),
            w_g: Vec::with_capacity(table.len()),
            w_total: Vec::with_capacity(table.len()),
        };

        for (&decade, result) in table.iter() {
            series.decades.push(decade);
            for (i, segment) in result.segments.iter().enumerate() {
                series.q_in[i].push(segment.q_in);
                series.s[i].push(segment.s);
                series.q_out[i].push(segment.q_out);
            }
            series.q_g.push(result.q_g);
            series.w_g.push(result.w_g);
            series.w_total.push(result.w_total);
        }
        series
    }
}
