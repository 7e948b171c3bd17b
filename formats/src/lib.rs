//! Definition of the unified output format
//!
//! This module holds the shared record model that the category decoders
//! fill in, plus the CSV export helper implementing the tabular
//! contract (47 columns, absent fields as empty cells).
//!

use std::fmt::Debug;

use csv::WriterBuilder;
use eyre::Result;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};
use tracing::trace;

// Re-export for convenience
//
pub use record::*;

mod record;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}

/// Output the final csv, one row per record.
///
/// Absent fields serialize as empty cells which is what the export
/// contract wants.
///
pub fn prepare_csv<T>(data: &[T], header: bool) -> Result<String>
where
    T: Serialize + Debug,
{
    trace!("Generating output…");
    // Prepare the writer
    //
    let mut wtr = WriterBuilder::new().has_headers(header).from_writer(vec![]);

    // Insert data
    //
    for rec in data {
        wtr.serialize(rec)?;
    }

    // Output final csv
    //
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// Display the export schema as a table, column name and unit.
///
pub fn schema() -> String {
    let units = [
        ("CAT", "category"),
        ("SAC", "code"),
        ("SIC", "code"),
        ("Time", "HH:MM:SS.mmm"),
        ("Time_sec", "s"),
        ("LAT", "deg"),
        ("LON", "deg"),
        ("H(m)", "m"),
        ("H(ft)", "ft"),
        ("RHO", "NM"),
        ("THETA", "deg"),
        ("Mode3/A", "octal"),
        ("V", "flag"),
        ("G", "flag"),
        ("L", "flag"),
        ("FL", "FL"),
        ("FL_V", "flag"),
        ("FL_G", "flag"),
        ("TA", "hex"),
        ("TI", "chars"),
        ("ModeS", "codes"),
        ("BP", "hPa"),
        ("RA", "deg"),
        ("TTA", "deg"),
        ("GS", "kt"),
        ("TAR", "deg/s"),
        ("TAS", "kt"),
        ("HDG", "deg"),
        ("IAS", "kt"),
        ("MACH", "Mach"),
        ("BAR", "ft/min"),
        ("IVV", "ft/min"),
        ("TN", "number"),
        ("GS(kt)", "kt"),
        ("STAT", "text"),
        ("TYP", "code"),
        ("SIM", "flag"),
        ("RDP", "flag"),
        ("SPI", "flag"),
        ("RAB", "flag"),
        ("H_WGS84", "m"),
        ("ATP", "code"),
        ("ARC", "code"),
        ("RC", "flag"),
        ("DCR", "flag"),
        ("GBS", "flag"),
        ("TST", "flag"),
    ];

    let mut builder = Builder::default();
    builder.push_record(["column", "unit"]);
    units.iter().for_each(|(name, unit)| {
        builder.push_record([*name, *unit]);
    });

    let mut table = builder.build();
    table.with(Style::modern());
    table.to_string()
}
