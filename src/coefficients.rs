//! Multiplicative adjustment coefficients applied to the base seepage loss.
//!
//! Every lookup is total: an absent or unrecognized categorical value maps to
//! the neutral coefficient 1.0 rather than an error or a zero.

use crate::calendar::Season;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const NEUTRAL: f64 = 1.0;

/// A categorical channel attribute that scales the seepage estimate.
pub trait Coefficient {
    fn coefficient(&self) -> f64;
}

impl<T: Coefficient> Coefficient for Option<T> {
    fn coefficient(&self) -> f64 {
        self.as_ref().map_or(NEUTRAL, Coefficient::coefficient)
    }
}

/// Returned by the categorical `FromStr` impls for an unrecognized value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category value '{}'", self.0)
    }
}

macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => ($key:literal, $coeff:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn key(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }
        }

        impl Coefficient for $name {
            fn coefficient(&self) -> f64 {
                match self {
                    $($name::$variant => $coeff),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }

        impl FromStr for $name {
            type Err = UnknownCategory;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key = s.trim().to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.key() == key)
                    .ok_or_else(|| UnknownCategory(s.to_string()))
            }
        }
    };
}

categorical! {
    /// Documented physical condition of the channel.
    Condition {
        Excellent => ("excellent", 0.9),
        Good => ("good", 1.0),
        Satisfactory => ("satisfactory", 1.2),
        Poor => ("poor", 1.4),
        Critical => ("critical", 1.6),
    }
}

categorical! {
    /// Vegetation density along the channel banks.
    Vegetation {
        None => ("none", 1.0),
        Minimal => ("minimal", 1.03),
        Moderate => ("moderate", 1.08),
        High => ("high", 1.12),
        Critical => ("critical", 1.15),
    }
}

categorical! {
    SoilType {
        Sandy => ("sandy", 1.5),
        Loam => ("loam", 1.0),
        Clay => ("clay", 0.7),
        Mixed => ("mixed", 1.0),
    }
}

categorical! {
    /// Lining material of the channel bed and walls.
    Coverage {
        Earth => ("earth", 1.5),
        Mixed => ("mixed", 1.3),
        Clay => ("clay", 1.2),
        Stone => ("stone", 1.1),
        Brick => ("brick", 1.0),
        Asphalt => ("asphalt", 0.9),
        Concrete => ("concrete", 0.7),
        Plastic => ("plastic", 0.6),
        Composite => ("composite", 0.6),
        Polyethylene => ("polyethylene", 0.5),
        Rubber => ("rubber", 0.5),
        Geomembrane => ("geomembrane", 0.4),
    }
}

impl Coefficient for Season {
    fn coefficient(&self) -> f64 {
        match self {
            Season::Spring => 1.1,
            Season::Summer => 1.2,
            Season::Autumn => 1.0,
            Season::Winter => 0.8,
        }
    }
}

impl FromStr for Season {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "autumn" => Ok(Season::Autumn),
            "winter" => Ok(Season::Winter),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// Groundwater depth in meters, discretized into three bands.
/// A shallow water table reduces infiltration, a deep one increases it.
/// A depth of exactly 0 is a measured surface water table and falls in the
/// shallow band; the dashboard this replaces treated 0 as unknown (neutral).
pub fn groundwater_coefficient(depth_m: Option<f64>) -> f64 {
    match depth_m {
        Some(d) if d.is_finite() && d >= 0.0 => {
            if d < 2.0 {
                0.8
            } else if d < 5.0 {
                1.0
            } else {
                1.2
            }
        }
        _ => NEUTRAL,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Condition,
    Vegetation,
    SoilType,
    Season,
    Coverage,
}

/// String-keyed lookup for callers holding raw form values.
pub fn coefficient(category: Category, value: &str) -> f64 {
    fn lookup<T: FromStr + Coefficient>(value: &str) -> f64 {
        value.parse::<T>().ok().coefficient()
    }

    match category {
        Category::Condition => lookup::<Condition>(value),
        Category::Vegetation => lookup::<Vegetation>(value),
        Category::SoilType => lookup::<SoilType>(value),
        Category::Season => lookup::<Season>(value),
        Category::Coverage => lookup::<Coverage>(value),
    }
}

/// Deserializes an optional categorical field, treating blanks and unrecognized
/// values as absent instead of failing the whole record.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        if s.trim().is_empty() {
            return None;
        }
        match s.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("Ignoring unrecognized category value '{}'", s);
                None
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_values() {
        assert_eq!(Condition::Excellent.coefficient(), 0.9);
        assert_eq!(Condition::Critical.coefficient(), 1.6);
        assert_eq!(Vegetation::High.coefficient(), 1.12);
        assert_eq!(SoilType::Sandy.coefficient(), 1.5);
        assert_eq!(SoilType::Clay.coefficient(), 0.7);
        assert_eq!(Season::Winter.coefficient(), 0.8);
        assert_eq!(Coverage::Earth.coefficient(), 1.5);
        assert_eq!(Coverage::Geomembrane.coefficient(), 0.4);
        assert_eq!(Coverage::ALL.len(), 12);
    }

    #[test]
    fn coverage_range() {
        let (min, max) = Coverage::ALL
            .iter()
            .map(Coefficient::coefficient)
            .fold((f64::MAX, f64::MIN), |(lo, hi), c| (lo.min(c), hi.max(c)));
        assert_eq!(min, 0.4);
        assert_eq!(max, 1.5);
    }

    #[test]
    fn unknown_values_are_neutral() {
        assert_eq!(coefficient(Category::Condition, "flooded"), 1.0);
        assert_eq!(coefficient(Category::Coverage, ""), 1.0);
        assert_eq!(coefficient(Category::Season, "monsoon"), 1.0);
        assert_eq!(None::<Vegetation>.coefficient(), 1.0);
    }

    #[test]
    fn string_lookup_matches_enum() {
        assert_eq!(coefficient(Category::Condition, "poor"), 1.4);
        assert_eq!(coefficient(Category::Vegetation, " Moderate "), 1.08);
        assert_eq!(coefficient(Category::SoilType, "loam"), 1.0);
        assert_eq!(coefficient(Category::Season, "spring"), 1.1);
        assert_eq!(coefficient(Category::Coverage, "concrete"), 0.7);
    }

    #[test]
    fn groundwater_bands() {
        assert_eq!(groundwater_coefficient(None), 1.0);
        assert_eq!(groundwater_coefficient(Some(f64::NAN)), 1.0);
        assert_eq!(groundwater_coefficient(Some(0.0)), 0.8);
        assert_eq!(groundwater_coefficient(Some(0.5)), 0.8);
        assert_eq!(groundwater_coefficient(Some(1.999)), 0.8);
        assert_eq!(groundwater_coefficient(Some(2.0)), 1.0);
        assert_eq!(groundwater_coefficient(Some(4.9)), 1.0);
        assert_eq!(groundwater_coefficient(Some(5.0)), 1.2);
        assert_eq!(groundwater_coefficient(Some(30.0)), 1.2);
    }
}
