//! Presentation of detail records: placeholder substitution and the text
//! table printed by the report command.

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::DetailRecord;

/// Shown for a sensor reading the backend did not provide.
pub const NOT_AVAILABLE: &str = "N/D";
/// Shown when a detail row has no alarm attached.
pub const NO_ALARM: &str = "Sin alarma";

pub const COLUMNS: [&str; 7] = [
    "fecha",
    "temp_tempeh",
    "temp_ambiente",
    "humedad",
    "aire",
    "estufa",
    "alarma",
];

#[derive(Clone, Debug, PartialEq)]
pub struct ShapedRow {
    pub timestamp: String,
    pub tempeh_temp: String,
    pub ambient_temp: String,
    pub humidity: String,
    pub ac_temp: String,
    pub stove_temp: String,
    pub alarm_name: String,
}

impl ShapedRow {
    /// Cells in [`COLUMNS`] order.
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.timestamp,
            &self.tempeh_temp,
            &self.ambient_temp,
            &self.humidity,
            &self.ac_temp,
            &self.stove_temp,
            &self.alarm_name,
        ]
    }
}

impl From<&DetailRecord> for ShapedRow {
    fn from(record: &DetailRecord) -> Self {
        ShapedRow {
            timestamp: record.timestamp.clone(),
            tempeh_temp: reading(record.tempeh_temp),
            ambient_temp: reading(record.ambient_temp),
            humidity: reading(record.humidity),
            ac_temp: reading(record.ac_temp),
            stove_temp: reading(record.stove_temp),
            alarm_name: record
                .alarm_name
                .clone()
                .unwrap_or_else(|| NO_ALARM.to_string()),
        }
    }
}

pub fn shape(records: &[DetailRecord]) -> Vec<ShapedRow> {
    records.iter().map(ShapedRow::from).collect()
}

fn reading(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

/// Renders rows as an indexed text table. Returns `None` for an empty
/// slice; callers print a notice instead.
pub fn render_table(rows: &[ShapedRow]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let mut builder = Builder::default();
    builder.push_record(std::iter::once("").chain(COLUMNS));
    for (index, row) in rows.iter().enumerate() {
        let cells = row.cells().map(str::to_string);
        builder.push_record(std::iter::once(index.to_string()).chain(cells));
    }

    Some(builder.build().with(Style::blank()).to_string())
}
