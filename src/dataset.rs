//! Table 16: decade discharges (l/s) of the inter-farm canals at PK 0, the
//! water users' association canals and the main canal of Rudaki district.
//!
//! The table is published in two halves, April-June and July-October, with
//! the same rows. Only the first half lists Ω.

use crate::error::Result;
use crate::flows::{FlowTable, SegmentFlowRow};

struct ReferenceRow {
    number: u32,
    name: &'static str,
    area: f64,
    omega: f64,
    /// Season decade order, apr_i .. oct_ii.
    decades: [f64; 20],
}

const ROWS: [ReferenceRow; 5] = [
    ReferenceRow {
        number: 1,
        name: "Inter-farm canal 1-MK at PK91+50",
        area: 18155.0,
        omega: 1061.3,
        decades: [
            1061.3, 2028.5, 4788.9, 7823.8, 14670.0, 16878.8, 17699.6, 20047.0, 9583.1, 9737.3,
            9170.0, 9002.7, 7251.3, 6425.3, 5097.4, 5215.0, 4723.6, 3931.5, 3586.5, 2316.0,
        ],
    },
    ReferenceRow {
        number: 2,
        name: "1-1K, WUA-1",
        area: 1663.0,
        omega: 97.2,
        decades: [
            97.2, 185.8, 438.7, 716.7, 1343.8, 1546.1, 1621.3, 1836.3, 877.8, 891.9, 840.0, 824.7,
            664.2, 588.6, 466.9, 477.7, 432.7, 360.1, 328.5, 212.1,
        ],
    },
    ReferenceRow {
        number: 3,
        name: "1-2K, WUA-2",
        area: 2650.0,
        omega: 154.9,
        decades: [
            154.9, 296.1, 699.0, 1142.0, 2141.3, 2463.7, 2583.5, 2926.2, 1398.8, 1421.3, 1338.5,
            1314.1, 1058.4, 937.9, 744.0, 761.2, 689.5, 573.9, 523.5, 338.1,
        ],
    },
    ReferenceRow {
        number: 4,
        name: "1-3K, WUA-3",
        area: 985.0,
        omega: 57.6,
        decades: [
            57.6, 110.1, 259.8, 424.5, 795.9, 915.8, 960.3, 1087.7, 519.9, 528.3, 497.5, 488.4,
            393.4, 348.6, 276.6, 282.9, 256.3, 213.3, 194.6, 125.7,
        ],
    },
    ReferenceRow {
        number: 5,
        name: "1-4K, WUA-4",
        area: 694.0,
        omega: 40.6,
        decades: [
            40.6, 77.5, 183.1, 299.1, 560.8, 645.2, 676.6, 766.3, 366.3, 372.2, 350.5, 344.1,
            277.2, 245.6, 194.9, 199.4, 180.6, 150.3, 137.1, 88.5,
        ],
    },
];

fn build(with_omega: bool) -> Result<FlowTable> {
    let rows = ROWS
        .iter()
        .map(|r| {
            let values: Vec<Option<f64>> = r.decades.iter().copied().map(Some).collect();
            let omega = with_omega.then_some(r.omega);
            SegmentFlowRow::from_season(r.number, r.name, r.area, omega, &values)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(FlowTable::new(rows))
}

/// April-June half, with Ω.
pub fn table16_part1() -> Result<FlowTable> {
    build(true)
}

/// July-October half.
pub fn table16_part2() -> Result<FlowTable> {
    build(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{DecadeIndex, DecadeKey, Month};
    use crate::flows::FlowSource;

    #[test]
    fn halves_share_rows() {
        let part1 = table16_part1().unwrap();
        let part2 = table16_part2().unwrap();
        assert_eq!(part1.rows.len(), 5);
        assert_eq!(part2.rows.len(), 5);
        assert_eq!(part1.row(1).and_then(|r| r.omega), Some(1061.3));
        assert!(part2.rows.iter().all(|r| r.omega.is_none()));
    }

    #[test]
    fn known_values() {
        let part1 = table16_part1().unwrap();
        let main = part1.source(FlowSource::MainChannel).unwrap();
        assert_eq!(main.flow(DecadeKey::new(Month::Jun, DecadeIndex::Second)), Some(20047.0));
        assert_eq!(main.flow(DecadeKey::new(Month::Oct, DecadeIndex::Second)), Some(2316.0));

        let t4 = part1.source(FlowSource::Tributary4).unwrap();
        assert_eq!(t4.flow(DecadeKey::new(Month::Apr, DecadeIndex::First)), Some(40.6));
    }
}
