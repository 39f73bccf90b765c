use crate::domain::models::{DATE_FORMAT, WateringEvent};
use serde_json::Value;

/// Column order of the mirror worksheet.
pub const ROW_COLUMNS: [&str; 6] = [
    "plant_type",
    "start_date",
    "interval",
    "repeat",
    "schedule",
    "note",
];

pub fn encode_watering_row(event: &WateringEvent) -> Vec<Value> {
    vec![
        Value::String(event.plant_type.label().to_string()),
        Value::String(event.start_date.format(DATE_FORMAT).to_string()),
        Value::from(event.interval),
        Value::from(event.repeat),
        Value::String(event.schedule_text()),
        Value::String(event.note.clone().unwrap_or_default()),
    ]
}
