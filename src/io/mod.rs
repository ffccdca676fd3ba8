pub mod csv;
#[cfg(feature = "netcdf")]
pub mod netcdf;
pub mod results;

use crate::error::Result;
use crate::routing::CalculatedTableResults;
use std::io::Write;

pub fn write_json<W: Write>(writer: W, table: &CalculatedTableResults) -> Result<()> {
    serde_json::to_writer_pretty(writer, table)?;
    Ok(())
}
