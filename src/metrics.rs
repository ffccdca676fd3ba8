//! Loss metrics and status of individual channel records.

use crate::calendar::Season;
use crate::coefficients::{Condition, Coverage, SoilType, Vegetation, lenient};
use crate::seepage::{
    AVERAGE_FILTRATION_COEFFICIENT, AppliedFactors, LossFactors, base_loss, enhanced_loss, evaporation_loss,
};
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentage above which a channel is critical regardless of its condition.
pub const CRITICAL_LOSS_PERCENTAGE: f64 = 30.0;
pub const HIGH_LOSS_PERCENTAGE: f64 = 15.0;

/// Condition assumed for records that do not document one.
pub const DEFAULT_CONDITION: Condition = Condition::Satisfactory;

/// A channel as entered by a user. Flows are in m³/s, length in km.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: String,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub depth: f64,
    #[serde(default)]
    pub water_flow: Option<f64>,
    pub water_volume_in: f64,
    pub water_volume_out: f64,
    #[serde(default)]
    pub filtration_coefficient: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub coverage: Option<Coverage>,
    #[serde(default, deserialize_with = "lenient")]
    pub condition: Option<Condition>,
    #[serde(default, deserialize_with = "lenient")]
    pub vegetation: Option<Vegetation>,
    #[serde(default)]
    pub groundwater_depth: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub season: Option<Season>,
    #[serde(default, deserialize_with = "lenient")]
    pub soil_type: Option<SoilType>,
    #[serde(default)]
    pub slope: Option<f64>,
    #[serde(default)]
    pub measurement_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_maintenance_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelStatus {
    Normal,
    HighLoss,
    Critical,
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelStatus::Normal => "normal",
            ChannelStatus::HighLoss => "high-loss",
            ChannelStatus::Critical => "critical",
        })
    }
}

/// First match wins. A poor or critical documented condition makes the
/// channel critical even when its measured loss is low.
pub fn classify_status(loss_percentage: f64, condition: Condition) -> ChannelStatus {
    if loss_percentage > CRITICAL_LOSS_PERCENTAGE || matches!(condition, Condition::Critical | Condition::Poor) {
        ChannelStatus::Critical
    } else if loss_percentage > HIGH_LOSS_PERCENTAGE || condition == Condition::Satisfactory {
        ChannelStatus::HighLoss
    } else {
        ChannelStatus::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    /// Inflow minus outflow. Negative when the record reports more water out
    /// than in; kept as measured.
    pub loss_volume: f64,
    pub loss_percentage: f64,
    pub loss_per_km: f64,
    /// Outflow over inflow, 1.0 when there is no inflow.
    pub efficiency: f64,
    pub status: ChannelStatus,
}

pub fn derive_metrics(channel: &ChannelRecord) -> ChannelMetrics {
    let q_in = channel.water_volume_in;
    let q_out = channel.water_volume_out;

    let loss_volume = q_in - q_out;
    if loss_volume < 0.0 {
        warn!(
            "Channel {} reports outflow {} above inflow {}",
            channel.id, q_out, q_in
        );
    }

    let loss_percentage = if q_in > 0.0 { loss_volume / q_in * 100.0 } else { 0.0 };
    let loss_per_km = if channel.length > 0.0 {
        loss_percentage / channel.length
    } else {
        0.0
    };
    let efficiency = if q_in > 0.0 { (q_out / q_in).max(0.0) } else { 1.0 };
    let status = classify_status(loss_percentage, channel.condition.unwrap_or(DEFAULT_CONDITION));

    ChannelMetrics {
        loss_volume,
        loss_percentage,
        loss_per_km,
        efficiency,
        status,
    }
}

/// Seepage estimated from the channel's attributes, as opposed to the loss
/// measured from its inflow and outflow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossAssessment {
    pub base_loss: f64,
    pub enhanced_loss: f64,
    pub enhanced_loss_percentage: f64,
    pub factors: AppliedFactors,
}

impl ChannelRecord {
    /// Season of measurement, falling back to the measurement date.
    pub fn effective_season(&self) -> Option<Season> {
        self.season
            .or_else(|| self.measurement_date.map(Season::from_date))
    }

    pub fn loss_factors(&self) -> LossFactors {
        LossFactors {
            condition: self.condition,
            vegetation: self.vegetation,
            groundwater_depth: self.groundwater_depth,
            season: self.effective_season(),
            soil_type: self.soil_type,
            coverage: self.coverage,
        }
    }

    /// Evaporation from the channel surface in m³/s for a rate in mm/day.
    pub fn evaporation(&self, rate_mm_day: f64) -> Option<f64> {
        evaporation_loss(self.length, self.width, rate_mm_day)
    }
}

pub fn assess_losses(channel: &ChannelRecord) -> LossAssessment {
    let a = channel
        .filtration_coefficient
        .unwrap_or(AVERAGE_FILTRATION_COEFFICIENT);
    let factors = channel.loss_factors();

    let base = base_loss(channel.water_volume_in, channel.length, a);
    let enhanced = enhanced_loss(base, &factors);
    let enhanced_loss_percentage = if channel.water_volume_in > 0.0 {
        enhanced / channel.water_volume_in * 100.0
    } else {
        0.0
    };

    LossAssessment {
        base_loss: base,
        enhanced_loss: enhanced,
        enhanced_loss_percentage,
        factors: factors.applied(),
    }
}

/// Headline figures over a set of channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetOverview {
    pub total_channels: usize,
    pub total_length_km: f64,
    pub critical: usize,
    pub high_loss: usize,
    pub normal: usize,
    /// Mean efficiency of the channels with a positive inflow.
    pub mean_efficiency: Option<f64>,
}

impl FleetOverview {
    pub fn from_channels<'a>(channels: impl IntoIterator<Item = &'a ChannelRecord>) -> Self {
        let mut overview = FleetOverview {
            total_channels: 0,
            total_length_km: 0.0,
            critical: 0,
            high_loss: 0,
            normal: 0,
            mean_efficiency: None,
        };
        let mut efficiency_sum = 0.0;
        let mut measured = 0usize;

        for channel in channels {
            let metrics = derive_metrics(channel);
            overview.total_channels += 1;
            overview.total_length_km += channel.length;
            match metrics.status {
                ChannelStatus::Critical => overview.critical += 1,
                ChannelStatus::HighLoss => overview.high_loss += 1,
                ChannelStatus::Normal => overview.normal += 1,
            }
            if channel.water_volume_in > 0.0 {
                efficiency_sum += metrics.efficiency;
                measured += 1;
            }
        }

        if measured > 0 {
            overview.mean_efficiency = Some(efficiency_sum / measured as f64);
        }
        overview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn channel(q_in: f64, q_out: f64, length: f64) -> ChannelRecord {
        ChannelRecord {
            id: "channel-1".into(),
            name: "Test".into(),
            length,
            water_volume_in: q_in,
            water_volume_out: q_out,
            ..Default::default()
        }
    }

    #[test]
    fn reference_channel() {
        let m = derive_metrics(&channel(10.0, 7.0, 5.0));
        assert_relative_eq!(m.loss_volume, 3.0);
        assert_relative_eq!(m.loss_percentage, 30.0, epsilon = 1e-9);
        assert_relative_eq!(m.loss_per_km, 6.0, epsilon = 1e-9);
        assert_relative_eq!(m.efficiency, 0.7);
        // 30% is not above the critical threshold; satisfactory default applies
        assert_eq!(m.status, ChannelStatus::HighLoss);
    }

    #[test]
    fn no_inflow() {
        let m = derive_metrics(&channel(0.0, 0.0, 5.0));
        assert_eq!(m.loss_percentage, 0.0);
        assert_eq!(m.loss_per_km, 0.0);
        assert_eq!(m.efficiency, 1.0);
    }

    #[test]
    fn zero_length() {
        let m = derive_metrics(&channel(10.0, 9.0, 0.0));
        assert_eq!(m.loss_per_km, 0.0);
    }

    #[test]
    fn outflow_above_inflow_is_not_corrected() {
        let m = derive_metrics(&channel(5.0, 6.0, 2.0));
        assert_relative_eq!(m.loss_volume, -1.0);
        assert_relative_eq!(m.loss_percentage, -20.0, epsilon = 1e-9);
        assert_relative_eq!(m.efficiency, 1.2, epsilon = 1e-9);
    }

    #[test]
    fn condition_overrides() {
        assert_eq!(classify_status(1.0, Condition::Poor), ChannelStatus::Critical);
        assert_eq!(classify_status(1.0, Condition::Critical), ChannelStatus::Critical);
        assert_eq!(classify_status(1.0, Condition::Satisfactory), ChannelStatus::HighLoss);
        assert_eq!(classify_status(1.0, Condition::Good), ChannelStatus::Normal);
        assert_eq!(classify_status(15.0, Condition::Excellent), ChannelStatus::Normal);
        assert_eq!(classify_status(15.01, Condition::Excellent), ChannelStatus::HighLoss);
        assert_eq!(classify_status(30.01, Condition::Excellent), ChannelStatus::Critical);
    }

    #[test]
    fn status_is_monotonic_in_loss() {
        let conditions = [
            Condition::Excellent,
            Condition::Good,
            Condition::Satisfactory,
            Condition::Poor,
            Condition::Critical,
        ];
        for condition in conditions {
            let mut previous = ChannelStatus::Normal;
            for step in 0..=1000 {
                let pct = -10.0 + step as f64 * 0.1;
                let status = classify_status(pct, condition);
                assert!(status >= previous, "{condition} at {pct}");
                previous = status;
            }
        }
    }

    #[test]
    fn assessment_uses_date_season_and_defaults() {
        let mut record = channel(1000.0, 900.0, 10.0);
        record.measurement_date = NaiveDate::from_ymd_opt(2024, 7, 1);
        record.coverage = Some(Coverage::Concrete);

        let assessment = assess_losses(&record);
        assert_relative_eq!(assessment.base_loss, 208.0, epsilon = 1e-9);
        assert_eq!(assessment.factors.season, 1.2);
        assert_eq!(assessment.factors.coverage, 0.7);
        assert_eq!(assessment.factors.condition, 1.0);
        assert_relative_eq!(assessment.enhanced_loss, 208.0 * 1.2 * 0.7, epsilon = 1e-9);
        assert_relative_eq!(assessment.enhanced_loss_percentage, 208.0 * 0.84 / 10.0, epsilon = 1e-9);
    }

    #[test]
    fn evaporation_over_channel_surface() {
        let mut record = channel(10.0, 9.0, 10.0);
        record.width = 5.0;
        // 4.32 mm/day over 50 000 m² is 216 m³/day
        assert_relative_eq!(record.evaporation(4.32).unwrap(), 0.0025, epsilon = 1e-12);
        assert_eq!(record.evaporation(0.0), None);

        record.width = 0.0;
        assert_eq!(record.evaporation(4.32), None);
    }

    #[test]
    fn fleet_overview() {
        let mut poor = channel(10.0, 9.5, 4.0);
        poor.condition = Some(Condition::Poor);
        let mut good = channel(10.0, 9.0, 2.0);
        good.condition = Some(Condition::Good);
        let dry = channel(0.0, 0.0, 1.5);

        let overview = FleetOverview::from_channels([&poor, &good, &dry]);
        assert_eq!(overview.total_channels, 3);
        assert_relative_eq!(overview.total_length_km, 7.5);
        assert_eq!(overview.critical, 1);
        assert_eq!(overview.high_loss, 1); // dry channel, satisfactory default
        assert_eq!(overview.normal, 1);
        assert_relative_eq!(overview.mean_efficiency.unwrap(), 0.925, epsilon = 1e-9);

        let empty = FleetOverview::from_channels(std::iter::empty());
        assert_eq!(empty.total_channels, 0);
        assert_eq!(empty.mean_efficiency, None);
    }
}
