use crate::error::Result;
use crate::io::results::TableSeries;
use crate::routing::CalculatedTableResults;

const FILL_VALUE: f64 = -9999.0;

fn filled(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(FILL_VALUE)).collect()
}

// Function to write a result table to NetCDF
pub fn write_netcdf_output(filename: &str, table: &CalculatedTableResults) -> Result<()> {
    let series = TableSeries::new(table);
    let mut file = netcdf::create(filename)?;

    file.add_dimension("segment", series.q_in.len())?;
    file.add_dimension("decade", series.decades.len())?;

    let mut segment_var = file.add_variable::<i32>("segment", &["segment"])?;
    segment_var.put_attribute("long_name", "Segment number")?;
    let segment_ids: Vec<i32> = (1..=series.q_in.len() as i32).collect();
    segment_var.put_values(&segment_ids, ..)?;

    let per_segment = [
        ("q_in", "Segment inflow", "l s-1", &series.q_in),
        ("s", "Seepage loss", "l s-1", &series.s),
        ("q_out", "Segment outflow", "l s-1", &series.q_out),
    ];
    for (name, long_name, units, data) in per_segment {
        let mut var = file.add_variable::<f64>(name, &["segment", "decade"])?;
        var.put_attribute("_FillValue", FILL_VALUE)?;
        var.put_attribute("long_name", long_name)?;
        var.put_attribute("units", units)?;
        var.put_attribute("missing_value", FILL_VALUE)?;
        for (i, values) in data.iter().enumerate() {
            var.put_values(&filled(values), (&i, ..))?;
        }
    }

    let per_decade = [
        ("q_g", "Total intake", "l s-1", &series.q_g),
        ("w_g", "Decade volume", "1e6 m3", &series.w_g),
        ("w_total", "Total decade volume", "1e6 m3", &series.w_total),
    ];
    for (name, long_name, units, data) in per_decade {
        let mut var = file.add_variable::<f64>(name, &["decade"])?;
        var.put_attribute("_FillValue", FILL_VALUE)?;
        var.put_attribute("long_name", long_name)?;
        var.put_attribute("units", units)?;
        var.put_attribute("missing_value", FILL_VALUE)?;
        var.put_values(&filled(data), ..)?;
    }

    // Global attributes
    let labels: Vec<String> = series.decades.iter().map(|k| k.to_string()).collect();
    file.add_attribute("TITLE", "OUTPUT FROM CANAL_LOSSES")?;
    file.add_attribute("decades", labels.join(","))?;

    Ok(())
}
