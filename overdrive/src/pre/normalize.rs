use crate::core::car::Car;
use crate::core::track::{Track, TrackTypeVocab, TypeBonus};
use crate::core::upgrade::Upgrade;
use crate::error::SchemaError;
use log::debug;
use std::collections::BTreeSet;

pub const TRACK_COLUMNS: [&str; 4] = ["Track", "Total Laps", "Track Type", "Type Bonus"];
pub const CAR_COLUMNS: [&str; 4] = ["Car", "Core Power", "Max Laps", "Track Type"];
pub const UPGRADE_COLUMNS: [&str; 4] = ["Upgrade", "Core Power", "Max Laps", "Track Type Condition"];

/// RawTable is a table of string cells as read from a CSV file (header row plus data rows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> RawTable {
        RawTable {
            name: name.to_owned(),
            headers,
            rows,
        }
    }

    /// Convenience constructor used for literal tables.
    pub fn from_str_rows(name: &str, headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn column_index(&self, column: &str) -> Result<usize, SchemaError> {
        self.headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| SchemaError::MissingColumn {
                table: self.name.to_owned(),
                column: column.to_owned(),
            })
    }

    /// The method returns the column indices of the given columns in the given order and checks
    /// that every row has the width of the header.
    fn require_columns<const N: usize>(
        &self,
        columns: [&str; N],
    ) -> Result<[usize; N], SchemaError> {
        let mut idxs = [0; N];
        for (idx, column) in idxs.iter_mut().zip(columns.iter()) {
            *idx = self.column_index(column)?;
        }

        for (row_no, row) in self.rows.iter().enumerate() {
            if row.len() != self.headers.len() {
                return Err(SchemaError::RaggedRow {
                    table: self.name.to_owned(),
                    row: row_no,
                    expected: self.headers.len(),
                    found: row.len(),
                });
            }
        }

        Ok(idxs)
    }

    fn invalid_value(&self, row: usize, column: &str, value: &str) -> SchemaError {
        SchemaError::InvalidValue {
            table: self.name.to_owned(),
            row,
            column: column.to_owned(),
            value: value.to_owned(),
        }
    }
}

/// split_track_types splits a cell like "Sunny/Night" into {"Sunny", "Night"}. An empty cell or
/// the placeholder "-" yields the empty set.
pub fn split_track_types(cell: &str) -> BTreeSet<String> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "-" {
        return BTreeSet::new();
    }
    cell.split('/')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

/// parse_type_bonus parses a cell like "30 Core Power" or "20 Max Laps". Anything that does not
/// start with an integer, or names neither "Core" nor "Max", yields a zero bonus.
pub fn parse_type_bonus(cell: &str) -> TypeBonus {
    let mut parts = cell.split_whitespace();
    let val = match parts.next().map(str::parse::<i64>) {
        Some(Ok(val)) => val,
        _ => {
            if !cell.trim().is_empty() {
                debug!("Unparsable type bonus '{}', using zero bonus", cell);
            }
            return TypeBonus::default();
        }
    };

    let rest: Vec<&str> = parts.collect();
    if rest.contains(&"Core") {
        TypeBonus::new(val, 0)
    } else if rest.contains(&"Max") {
        TypeBonus::new(0, val)
    } else {
        debug!("Type bonus '{}' names no stat, using zero bonus", cell);
        TypeBonus::default()
    }
}

/// Integer cells must be numeric; fractional values like "50.5" are truncated toward zero.
fn parse_int_truncating(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if let Ok(val) = cell.parse::<i64>() {
        return Some(val);
    }
    parse_real_strict(cell).map(|val| val.trunc() as i64)
}

fn parse_real_strict(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// normalize_tracks validates the tracks table and converts its rows into tracks.
pub fn normalize_tracks(table: &RawTable) -> Result<Vec<Track>, SchemaError> {
    let [i_name, i_laps, i_type, i_bonus] = table.require_columns(TRACK_COLUMNS)?;

    let mut tracks = Vec::with_capacity(table.rows.len());
    for (row_no, row) in table.rows.iter().enumerate() {
        let tot_no_laps = parse_int_truncating(&row[i_laps])
            .filter(|&laps| laps > 0)
            .and_then(|laps| u32::try_from(laps).ok())
            .ok_or_else(|| table.invalid_value(row_no, TRACK_COLUMNS[1], &row[i_laps]))?;

        tracks.push(Track {
            name: row[i_name].trim().to_owned(),
            tot_no_laps,
            track_type: row[i_type].trim().to_owned(),
            type_bonus: parse_type_bonus(&row[i_bonus]),
            type_bonus_raw: row[i_bonus].trim().to_owned(),
        });
    }

    Ok(tracks)
}

/// normalize_cars validates the cars table and converts its rows into cars.
pub fn normalize_cars(table: &RawTable) -> Result<Vec<Car>, SchemaError> {
    let [i_name, i_core, i_laps, i_types] = table.require_columns(CAR_COLUMNS)?;

    let mut cars = Vec::with_capacity(table.rows.len());
    for (row_no, row) in table.rows.iter().enumerate() {
        let core_power = parse_real_strict(&row[i_core])
            .filter(|&core| core >= 0.0)
            .ok_or_else(|| table.invalid_value(row_no, CAR_COLUMNS[1], &row[i_core]))?;
        let max_laps = parse_int_truncating(&row[i_laps])
            .and_then(|laps| u32::try_from(laps).ok())
            .ok_or_else(|| table.invalid_value(row_no, CAR_COLUMNS[2], &row[i_laps]))?;

        cars.push(Car {
            name: row[i_name].trim().to_owned(),
            core_power,
            max_laps,
            track_types: split_track_types(&row[i_types]),
        });
    }

    Ok(cars)
}

/// normalize_upgrades validates the upgrades table and converts its rows into upgrades. Bonus
/// cells that cannot be read as numbers count as 0.
pub fn normalize_upgrades(table: &RawTable) -> Result<Vec<Upgrade>, SchemaError> {
    let [i_name, i_core, i_laps, i_cond] = table.require_columns(UPGRADE_COLUMNS)?;

    Ok(table
        .rows
        .iter()
        .map(|row| Upgrade {
            name: row[i_name].trim().to_owned(),
            core_power: parse_real_strict(&row[i_core]).unwrap_or(0.0),
            max_laps: parse_real_strict(&row[i_laps])
                .map(|laps| laps.trunc() as i64)
                .unwrap_or(0),
            condition: split_track_types(&row[i_cond]),
        })
        .collect())
}

/// EntityTables holds the normalized input of a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTables {
    pub tracks: Vec<Track>,
    pub cars: Vec<Car>,
    pub upgrades: Option<Vec<Upgrade>>,
}

impl EntityTables {
    pub fn from_raw(
        tracks: &RawTable,
        cars: &RawTable,
        upgrades: Option<&RawTable>,
    ) -> Result<EntityTables, SchemaError> {
        Ok(EntityTables {
            tracks: normalize_tracks(tracks)?,
            cars: normalize_cars(cars)?,
            upgrades: upgrades.map(normalize_upgrades).transpose()?,
        })
    }

    pub fn track_types(&self) -> TrackTypeVocab {
        TrackTypeVocab::from_tracks(&self.tracks)
    }
}
