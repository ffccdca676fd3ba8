use crate::calendar::Month;
use crate::error::{LossError, Result};
use crate::flows::{FlowTable, SegmentFlowRow};
use crate::io::results::flatten;
use crate::metrics::{ChannelRecord, ChannelStatus, assess_losses, derive_metrics};
use crate::routing::CalculatedTableResults;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

// Column layout of a flow table file
#[derive(Debug)]
struct FlowColumns {
    number: usize,
    name: usize,
    area: Option<usize>,
    omega: Option<usize>,
    decades: Vec<(usize, Month, usize)>,
}

impl FlowColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let missing = |name: &str| LossError::MalformedRow {
            row: 0,
            reason: format!("missing column '{}'", name),
        };

        let mut decades = Vec::new();
        for (col, header) in headers.iter().enumerate() {
            let Some((month, roman)) = header.split_once('_') else {
                continue;
            };
            let Ok(month) = month.parse::<Month>() else {
                continue;
            };
            let index = match roman.to_lowercase().as_str() {
                "i" => 0,
                "ii" => 1,
                "iii" => 2,
                _ => return Err(LossError::InvalidDecadeKey(header.to_string())),
            };
            decades.push((col, month, index));
        }

        for month in Month::ALL {
            let mut present: Vec<usize> = decades
                .iter()
                .filter(|(_, m, _)| *m == month)
                .map(|(_, _, i)| *i)
                .collect();
            present.sort_unstable();
            present.truncate(month.decade_count());
            if present != (0..month.decade_count()).collect::<Vec<_>>() {
                return Err(LossError::MalformedRow {
                    row: 0,
                    reason: format!("incomplete decade columns for {}", month),
                });
            }
        }

        Ok(FlowColumns {
            number: find("number").ok_or_else(|| missing("number"))?,
            name: find("name").ok_or_else(|| missing("name"))?,
            area: find("area"),
            omega: find("omega"),
            decades,
        })
    }
}

fn parse_cell(record: &StringRecord, col: usize, row: usize) -> Result<Option<f64>> {
    let cell = record.get(col).unwrap_or("").trim();
    if cell.is_empty() || cell == "-" {
        return Ok(None);
    }
    let value = cell.parse::<f64>().map_err(|e| LossError::MalformedRow {
        row,
        reason: format!("'{}' in column {}: {}", cell, col, e),
    })?;
    // NaN or inf would route as a measured flow
    if !value.is_finite() {
        return Err(LossError::MalformedRow {
            row,
            reason: format!("non-finite value '{}' in column {}", cell, col),
        });
    }
    Ok(Some(value))
}

/// Reads a flow table. Empty cells (or `-`) are unmeasured decades.
pub fn read_flow_table<R: Read>(reader: R) -> Result<FlowTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = FlowColumns::from_headers(rdr.headers()?)?;
    let mut rows = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let line = i + 1;

        let number = record
            .get(columns.number)
            .unwrap_or("")
            .parse::<u32>()
            .map_err(|e| LossError::MalformedRow {
                row: line,
                reason: format!("row number: {}", e),
            })?;
        let name = record.get(columns.name).unwrap_or("").to_string();
        let area = match columns.area {
            Some(col) => parse_cell(&record, col, line)?.unwrap_or(0.0),
            None => 0.0,
        };
        let omega = match columns.omega {
            Some(col) => parse_cell(&record, col, line)?,
            None => None,
        };

        let mut decades: BTreeMap<Month, Vec<Option<f64>>> = BTreeMap::new();
        for &(col, month, index) in &columns.decades {
            let values = decades.entry(month).or_insert_with(|| vec![None; 3]);
            values[index] = parse_cell(&record, col, line)?;
        }

        let row = SegmentFlowRow::new(number, name, area, omega, decades).map_err(|e| {
            LossError::MalformedRow {
                row: line,
                reason: e.to_string(),
            }
        })?;
        rows.push(row);
    }

    Ok(FlowTable::new(rows))
}

pub fn load_flow_table(path: &Path) -> Result<FlowTable> {
    let file = File::open(path)?;
    let table = read_flow_table(BufReader::new(file))?;
    info!("Loaded {} flow rows from {}", table.rows.len(), path.display());
    Ok(table)
}

pub fn write_results<W: Write>(writer: W, table: &CalculatedTableResults) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in flatten(table) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_channels<R: Read>(reader: R) -> Result<Vec<ChannelRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut channels = Vec::new();
    for result in rdr.deserialize() {
        let record: ChannelRecord = result?;
        channels.push(record);
    }
    Ok(channels)
}

pub fn load_channels(path: &Path) -> Result<Vec<ChannelRecord>> {
    let file = File::open(path)?;
    let channels = read_channels(BufReader::new(file))?;
    info!("Loaded {} channel records from {}", channels.len(), path.display());
    Ok(channels)
}

// Derived fields written back alongside the channel identity
#[derive(Debug, Serialize)]
struct ChannelReport<'a> {
    id: &'a str,
    name: &'a str,
    length: f64,
    water_volume_in: f64,
    water_volume_out: f64,
    loss_volume: f64,
    loss_percentage: f64,
    loss_per_km: f64,
    efficiency: f64,
    status: ChannelStatus,
    base_loss: f64,
    enhanced_loss: f64,
    enhanced_loss_percentage: f64,
}

pub fn write_channel_reports<W: Write>(writer: W, channels: &[ChannelRecord]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
    for channel in channels {
        let metrics = derive_metrics(channel);
        let assessment = assess_losses(channel);
        wtr.serialize(ChannelReport {
            id: &channel.id,
            name: &channel.name,
            length: channel.length,
            water_volume_in: channel.water_volume_in,
            water_volume_out: channel.water_volume_out,
            loss_volume: metrics.loss_volume,
            loss_percentage: metrics.loss_percentage,
            loss_per_km: metrics.loss_per_km,
            efficiency: metrics.efficiency,
            status: metrics.status,
            base_loss: assessment.base_loss,
            enhanced_loss: assessment.enhanced_loss,
            enhanced_loss_percentage: assessment.enhanced_loss_percentage,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{DecadeIndex, DecadeKey};
    use crate::coefficients::{Condition, Coverage};

    fn header() -> String {
        let decades: Vec<String> = DecadeKey::season().map(|k| k.to_string()).collect();
        format!("number,name,area,omega,{},oct_iii", decades.join(","))
    }

    fn line(number: u32, value: &str) -> String {
        let cells = vec![value; 20];
        format!("{},row {},100,,{},", number, number, cells.join(","))
    }

    #[test]
    fn reads_flow_table_with_gaps() {
        let mut gap = vec!["5.0"; 20];
        gap[12] = ""; // aug_i
        let csv = format!(
            "{}\n{}\n1,main,18155,1061.3,{},\n",
            header(),
            line(5, "2.5"),
            gap.join(",")
        );

        let table = read_flow_table(csv.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);

        let main = table.row(1).unwrap();
        assert_eq!(main.omega, Some(1061.3));
        assert_eq!(main.flow(DecadeKey::new(Month::Aug, DecadeIndex::First)), None);
        assert_eq!(main.flow(DecadeKey::new(Month::Aug, DecadeIndex::Second)), Some(5.0));
        assert_eq!(table.row(5).unwrap().omega, None);
        assert_eq!(table.row(5).unwrap().month(Month::Oct), &[Some(2.5), Some(2.5)]);
    }

    #[test]
    fn rejects_bad_cells_and_missing_columns() {
        let csv = format!("{}\n{}\n", header(), line(2, "abc"));
        assert!(matches!(
            read_flow_table(csv.as_bytes()),
            Err(LossError::MalformedRow { row: 1, .. })
        ));

        let csv = "number,name,apr_i,apr_ii\n1,x,1,2\n";
        assert!(matches!(
            read_flow_table(csv.as_bytes()),
            Err(LossError::MalformedRow { row: 0, .. })
        ));

        // a measured third October decade does not fit the calendar;
        // the error names the data line, not the row number
        let csv = format!("{}\n{}\n{}9\n", header(), line(1, "1.0"), line(5, "1.0"));
        assert!(matches!(
            read_flow_table(csv.as_bytes()),
            Err(LossError::MalformedRow { row: 2, .. })
        ));
    }

    #[test]
    fn rejects_non_finite_flows() {
        for bad in ["NaN", "inf", "-inf"] {
            let mut cells = vec!["5.0"; 20];
            cells[3] = bad; // may_i
            let csv = format!("{}\n{}\n5,row 5,100,,{},\n", header(), line(1, "1.0"), cells.join(","));
            assert!(
                matches!(read_flow_table(csv.as_bytes()), Err(LossError::MalformedRow { row: 2, .. })),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn reads_channels_leniently() {
        let csv = "\
id,name,length,width,depth,water_volume_in,water_volume_out,coverage,condition,season,measurement_date
c1,North,5,2,1,10,7,concrete,poor,,2024-05-10
c2,South,2,1.5,0.8,4,3.8,marble,,summer,
";
        let channels = read_channels(csv.as_bytes()).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].coverage, Some(Coverage::Concrete));
        assert_eq!(channels[0].condition, Some(Condition::Poor));
        assert_eq!(channels[0].season, None);
        assert!(channels[0].measurement_date.is_some());
        // unknown coverage degrades to absent
        assert_eq!(channels[1].coverage, None);
        assert_eq!(channels[1].filtration_coefficient, None);
    }

    #[test]
    fn writes_reports() {
        let csv = "id,name,length,width,depth,water_volume_in,water_volume_out\nc1,North,5,2,1,10,7\n";
        let channels = read_channels(csv.as_bytes()).unwrap();

        let mut out = Vec::new();
        write_channel_reports(&mut out, &channels).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("id,name,length"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("c1,North,5.0,10.0,7.0,3.0,30.0,6.0,0.7,high-loss"));
    }

    #[test]
    fn writes_results_with_empty_cells_for_unset_values() {
        use crate::dataset::{table16_part1, table16_part2};
        use crate::routing::calculate_hydrology_table;

        let table = calculate_hydrology_table(&table16_part1().unwrap(), &table16_part2().unwrap()).unwrap();
        let mut out = Vec::new();
        write_results(&mut out, &table).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("decade,row,q_in,s,q_out,value\n"));
        assert!(text.contains("\njul_i,segment_4,,,,\n"));
        assert!(text.contains("\njul_ii,q_g,,,,\n"));
        assert_eq!(text.lines().count(), 1 + 20 * 7);
    }
}
