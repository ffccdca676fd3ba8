//! Decade intake volumes and their totals over a month or the season.
//!
//! Absence propagates: an unset intake gives an unset volume, never zero.

use crate::calendar::Month;
use crate::routing::CalculatedTableResults;

/// m³ delivered per day by a flow of 1 l/s (86400 s / 1000 l).
pub const LPS_DAY_TO_M3: f64 = 86.4;

/// Decade volume Wg in million m³ for an intake `q_g` in l/s.
pub fn decade_volume(q_g: Option<f64>, days: f64) -> Option<f64> {
    q_g.map(|q| LPS_DAY_TO_M3 * days * q / 1e6)
}

/// Total decade volume W = Wg + Wreturn.
pub fn total_volume(w_g: Option<f64>, return_flow: f64) -> Option<f64> {
    w_g.map(|w| w + return_flow)
}

fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values.flatten().fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Sum of the computed total volumes of a month, `None` if no decade of the
/// month was computed.
pub fn monthly_volume(table: &CalculatedTableResults, month: Month) -> Option<f64> {
    sum_present(month.decades().filter_map(|key| table.get(key)).map(|r| r.w_total))
}

/// Sum of the computed total volumes over the whole season.
pub fn season_volume(table: &CalculatedTableResults) -> Option<f64> {
    sum_present(table.iter().map(|(_, r)| r.w_total))
}
