use crate::pre::normalize::{EntityTables, RawTable};
use anyhow::Context;
use log::{info, warn};
use std::path::Path;

/// read_raw_table reads a CSV file with a header row into a table of trimmed string cells.
pub fn read_raw_table(filepath: &Path, table_name: &str) -> anyhow::Result<RawTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(filepath)
        .context(format!("Failed to open {} file {}!", table_name, filepath.display()))?;

    let headers: Vec<String> = csv_reader
        .headers()
        .context(format!("Failed to read header of {}!", filepath.display()))?
        .iter()
        .map(str::to_owned)
        .collect();

    let mut rows = vec![];
    for result in csv_reader.records() {
        let record =
            result.context(format!("Failed to read record of {}!", filepath.display()))?;
        rows.push(record.iter().map(str::to_owned).collect());
    }

    Ok(RawTable::new(table_name, headers, rows))
}

/// read_entity_tables reads and normalizes the tracks, cars and (optional) upgrades files. An
/// upgrades file that does not exist is treated as "no upgrades".
pub fn read_entity_tables(
    tracks_path: &Path,
    cars_path: &Path,
    upgrades_path: Option<&Path>,
) -> anyhow::Result<EntityTables> {
    let tracks = read_raw_table(tracks_path, "tracks")?;
    let cars = read_raw_table(cars_path, "cars")?;

    let upgrades = match upgrades_path {
        Some(path) if path.exists() => Some(read_raw_table(path, "upgrades")?),
        Some(path) => {
            warn!(
                "Upgrades file {} not found, only 'No Upgrade' is available",
                path.display()
            );
            None
        }
        None => None,
    };

    let tables = EntityTables::from_raw(&tracks, &cars, upgrades.as_ref())
        .context("Failed to normalize input tables!")?;

    info!(
        "Loaded {} tracks, {} cars and {} upgrades",
        tables.tracks.len(),
        tables.cars.len(),
        tables.upgrades.as_ref().map_or(0, Vec::len)
    );

    Ok(tables)
}
