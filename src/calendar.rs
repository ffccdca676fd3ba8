//! Irrigation-season calendar: months April..October split into 10-day decades.
//!
//! October is the last, partial month of the measurement campaign and carries
//! only two decades. Every iteration over decades goes through
//! [`Month::decades`] so that rule lives in one place.

use crate::error::{LossError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
}

/// Which half of the reference table a month's measurements are published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableHalf {
    /// April to June.
    First,
    /// July to October.
    Second,
}

impl Month {
    pub const ALL: [Month; 7] = [
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
    ];

    /// The month in which only the head segment of the chain is computed.
    pub const DRY_SEASON_TRANSITION: Month = Month::Jul;

    pub fn key(self) -> &'static str {
        match self {
            Month::Apr => "apr",
            Month::May => "may",
            Month::Jun => "jun",
            Month::Jul => "jul",
            Month::Aug => "aug",
            Month::Sep => "sep",
            Month::Oct => "oct",
        }
    }

    /// Calendar month number (1-12).
    pub fn number(self) -> u32 {
        match self {
            Month::Apr => 4,
            Month::May => 5,
            Month::Jun => 6,
            Month::Jul => 7,
            Month::Aug => 8,
            Month::Sep => 9,
            Month::Oct => 10,
        }
    }

    pub fn decade_count(self) -> usize {
        match self {
            Month::Oct => 2,
            _ => 3,
        }
    }

    pub fn decades(self) -> impl Iterator<Item = DecadeKey> {
        DecadeIndex::ALL
            .into_iter()
            .take(self.decade_count())
            .map(move |decade| DecadeKey::new(self, decade))
    }

    pub fn table_half(self) -> TableHalf {
        match self {
            Month::Apr | Month::May | Month::Jun => TableHalf::First,
            _ => TableHalf::Second,
        }
    }

    pub fn is_dry_season_transition(self) -> bool {
        self == Self::DRY_SEASON_TRANSITION
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Month {
    type Err = LossError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        Month::ALL
            .into_iter()
            .find(|m| m.key() == key)
            .ok_or_else(|| LossError::UnknownMonth(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecadeIndex {
    First,
    Second,
    Third,
}

impl DecadeIndex {
    pub const ALL: [DecadeIndex; 3] = [DecadeIndex::First, DecadeIndex::Second, DecadeIndex::Third];

    pub fn index(self) -> usize {
        match self {
            DecadeIndex::First => 0,
            DecadeIndex::Second => 1,
            DecadeIndex::Third => 2,
        }
    }

    pub fn roman(self) -> &'static str {
        match self {
            DecadeIndex::First => "i",
            DecadeIndex::Second => "ii",
            DecadeIndex::Third => "iii",
        }
    }
}

/// A (month, decade) pair, written `"{month}_{i|ii|iii}"`, e.g. `aug_ii`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecadeKey {
    pub month: Month,
    pub decade: DecadeIndex,
}

impl DecadeKey {
    pub fn new(month: Month, decade: DecadeIndex) -> Self {
        DecadeKey { month, decade }
    }

    /// All decades of the season in calendar order (20 in total).
    pub fn season() -> impl Iterator<Item = DecadeKey> {
        Month::ALL.into_iter().flat_map(Month::decades)
    }

    pub fn is_valid(&self) -> bool {
        self.decade.index() < self.month.decade_count()
    }
}

impl fmt::Display for DecadeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.month, self.decade.roman())
    }
}

impl FromStr for DecadeKey {
    type Err = LossError;

    fn from_str(s: &str) -> Result<Self> {
        let (month, roman) = s
            .trim()
            .split_once('_')
            .ok_or_else(|| LossError::InvalidDecadeKey(s.to_string()))?;
        let month: Month = month.parse()?;
        let decade = DecadeIndex::ALL
            .into_iter()
            .find(|d| d.roman() == roman)
            .ok_or_else(|| LossError::InvalidDecadeKey(s.to_string()))?;

        let key = DecadeKey::new(month, decade);
        if !key.is_valid() {
            return Err(LossError::InvalidDecadeKey(s.to_string()));
        }
        Ok(key)
    }
}

impl Serialize for DecadeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DecadeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Season of a measurement date: Mar-May spring, Jun-Aug summer,
    /// Sep-Nov autumn, Dec-Feb winter.
    pub fn from_date(date: NaiveDate) -> Self {
        match date.month() {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn october_has_two_decades() {
        let oct: Vec<_> = Month::Oct.decades().map(|k| k.to_string()).collect();
        assert_eq!(oct, vec!["oct_i", "oct_ii"]);

        for month in Month::ALL.into_iter().filter(|m| *m != Month::Oct) {
            assert_eq!(month.decades().count(), 3, "{month}");
        }
        assert_eq!(DecadeKey::season().count(), 20);
    }

    #[test]
    fn decade_keys_parse_and_display() {
        let key: DecadeKey = "sep_iii".parse().unwrap();
        assert_eq!(key, DecadeKey::new(Month::Sep, DecadeIndex::Third));
        assert_eq!(key.to_string(), "sep_iii");

        assert!("oct_iii".parse::<DecadeKey>().is_err());
        assert!("nov_i".parse::<DecadeKey>().is_err());
        assert!("aug".parse::<DecadeKey>().is_err());
        assert!("aug_iv".parse::<DecadeKey>().is_err());
    }

    #[test]
    fn season_keys_are_in_calendar_order() {
        let keys: Vec<_> = DecadeKey::season().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.first().map(|k| k.to_string()).as_deref(), Some("apr_i"));
        assert_eq!(keys.last().map(|k| k.to_string()).as_deref(), Some("oct_ii"));
    }

    #[test]
    fn table_halves() {
        assert_eq!(Month::Jun.table_half(), TableHalf::First);
        assert_eq!(Month::Jul.table_half(), TableHalf::Second);
        assert!(Month::Jul.is_dry_season_transition());
        assert!(!Month::Aug.is_dry_season_transition());
    }

    #[test]
    fn season_from_date() {
        let d = |m| NaiveDate::from_ymd_opt(2024, m, 15).unwrap();
        assert_eq!(Season::from_date(d(3)), Season::Spring);
        assert_eq!(Season::from_date(d(5)), Season::Spring);
        assert_eq!(Season::from_date(d(6)), Season::Summer);
        assert_eq!(Season::from_date(d(8)), Season::Summer);
        assert_eq!(Season::from_date(d(11)), Season::Autumn);
        assert_eq!(Season::from_date(d(12)), Season::Winter);
        assert_eq!(Season::from_date(d(2)), Season::Winter);
    }

    #[test]
    fn decade_key_serializes_as_string() {
        let key = DecadeKey::new(Month::Aug, DecadeIndex::Second);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"aug_ii\"");
        let back: DecadeKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
