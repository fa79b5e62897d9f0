use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use polars::prelude::*;

use crate::core::domain::{Chronology, FieldCatalog};
use crate::error::{Result, SchedulerError};
use crate::io::loaders::SourceFormat;
use crate::tactician::Tactician;
use crate::time::{format_utc, ModifiedJulianDate};

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| SchedulerError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// One row per recorded decision, in chronological order.
pub fn chronology_to_dataframe(chronology: &Chronology) -> Result<DataFrame> {
    let n = chronology.len();
    let mut ids = Vec::with_capacity(n);
    let mut times = Vec::with_capacity(n);
    let mut mjds = Vec::with_capacity(n);
    let mut ras = Vec::with_capacity(n);
    let mut decs = Vec::with_capacity(n);
    let mut filters = Vec::with_capacity(n);
    let mut tilings = Vec::with_capacity(n);
    let mut airmasses = Vec::with_capacity(n);
    let mut hour_angles = Vec::with_capacity(n);
    let mut slews = Vec::with_capacity(n);
    let mut moon_angles = Vec::with_capacity(n);
    let mut moon_phases = Vec::with_capacity(n);
    let mut exptimes = Vec::with_capacity(n);

    for entry in chronology.iter() {
        ids.push(entry.field_id.value());
        times.push(format_utc(entry.time));
        mjds.push(ModifiedJulianDate::from_datetime(entry.time).value());
        ras.push(entry.ra);
        decs.push(entry.dec);
        filters.push(entry.filter.as_str());
        tilings.push(entry.tiling);
        airmasses.push(entry.airmass);
        hour_angles.push(entry.hour_angle);
        slews.push(entry.slew);
        moon_angles.push(entry.moon_angle);
        moon_phases.push(entry.moon_phase);
        exptimes.push(entry.exptime);
    }

    let df = df!(
        "id" => ids,
        "time" => times,
        "mjd" => mjds,
        "ra" => ras,
        "dec" => decs,
        "filter" => filters,
        "tiling" => tilings,
        "airmass" => airmasses,
        "hour_angle" => hour_angles,
        "slew" => slews,
        "moon_angle" => moon_angles,
        "moon_phase" => moon_phases,
        "exptime" => exptimes,
    )?;

    Ok(df)
}

/// Per-field metrics at the tactician's current date, with viability.
///
/// Before a date is set every metric column holds its neutral value and no
/// field is viable.
pub fn metrics_to_dataframe(catalog: &FieldCatalog, tactician: &Tactician) -> Result<DataFrame> {
    let ids: Vec<i64> = catalog.iter().map(|f| f.id.value()).collect();
    let filters: Vec<&str> = catalog.iter().map(|f| f.band.as_str()).collect();
    let tilings: Vec<u32> = catalog.iter().map(|f| f.tiling).collect();
    let observed: Vec<bool> = catalog.iter().map(|f| f.is_observed()).collect();

    let df = df!(
        "id" => ids,
        "filter" => filters,
        "tiling" => tilings,
        "observed" => observed,
        "airmass" => tactician.airmass(),
        "hour_angle" => tactician.hour_angle(),
        "moon_angle" => tactician.moon_angle(),
        "slew" => tactician.slew(),
        "viable" => tactician.viable_fields(catalog),
    )?;

    Ok(df)
}

/// Write the chronology as CSV.
pub fn write_chronology_csv(chronology: &Chronology, path: &Path) -> Result<()> {
    let mut df = chronology_to_dataframe(chronology)?;
    let mut file = create_file(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    Ok(())
}

/// Write the chronology as a JSON array of entries.
pub fn write_chronology_json(chronology: &Chronology, path: &Path) -> Result<()> {
    let writer = BufWriter::new(create_file(path)?);
    serde_json::to_writer_pretty(writer, chronology)?;
    Ok(())
}

/// Write the chronology in the format named by the file extension.
pub fn write_chronology(chronology: &Chronology, path: &Path) -> Result<()> {
    match SourceFormat::from_path(path)? {
        SourceFormat::Csv => write_chronology_csv(chronology, path),
        SourceFormat::Json => write_chronology_json(chronology, path),
    }
}
