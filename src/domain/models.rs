use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const INTERVAL_OPTIONS: [u32; 7] = [3, 5, 7, 10, 14, 21, 28];
pub const REPEAT_OPTIONS: [u32; 4] = [3, 5, 10, 15];
pub const DEFAULT_INTERVAL: u32 = 7;
pub const DEFAULT_REPEAT: u32 = 5;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Note attached to a schedule whose start date was moved forward by rain.
pub const RAIN_OVERRIDE_NOTE: &str = "因下雨提前澆水（選擇日期）";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlantType {
    #[serde(alias = "大植株")]
    Large,
    #[default]
    #[serde(alias = "小植株")]
    Small,
}

impl PlantType {
    pub const ALL: [PlantType; 2] = [PlantType::Large, PlantType::Small];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Large => "large",
            Self::Small => "small",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Large => "大植株",
            Self::Small => "小植株",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "large" | "大植株" => Some(Self::Large),
            "small" | "小植株" => Some(Self::Small),
            _ => None,
        }
    }
}

impl fmt::Display for PlantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Last-used form inputs, persisted between sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WateringConfig {
    pub plant_type: PlantType,
    pub date: NaiveDate,
    pub interval: u32,
    pub repeat: u32,
}

impl WateringConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_interval(self.interval)?;
        validate_repeat(self.repeat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledWatering {
    pub index: u32,
    pub date: NaiveDate,
}

impl ScheduledWatering {
    pub fn line(&self) -> String {
        format!("第 {} 次：{}", self.index, self.date.format(DATE_FORMAT))
    }
}

/// One computed schedule. Only ever flattened into the record log and the sheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WateringEvent {
    pub plant_type: PlantType,
    pub start_date: NaiveDate,
    pub interval: u32,
    pub repeat: u32,
    pub computed_dates: Vec<ScheduledWatering>,
    pub note: Option<String>,
}

impl WateringEvent {
    pub fn header(&self) -> String {
        format!(
            "【{}】澆水預估\n最近一次澆水日：{}\n週期：{} 天，預估次數：{}",
            self.plant_type.label(),
            self.start_date.format(DATE_FORMAT),
            self.interval,
            self.repeat
        )
    }

    pub fn schedule_lines(&self) -> Vec<String> {
        self.computed_dates.iter().map(ScheduledWatering::line).collect()
    }

    pub fn schedule_text(&self) -> String {
        self.schedule_lines().join("\n")
    }

    pub fn note_line(&self) -> Option<String> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(|note| format!("【備註】{note}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
}

impl OAuthToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>, skew_seconds: i64) -> bool {
        !self.access_token.trim().is_empty()
            && self.expires_at > now + chrono::Duration::seconds(skew_seconds.max(0))
    }
}

pub fn validate_interval(interval: u32) -> Result<(), String> {
    if INTERVAL_OPTIONS.contains(&interval) {
        Ok(())
    } else {
        Err(format!("interval must be one of {INTERVAL_OPTIONS:?}, got {interval}"))
    }
}

pub fn validate_repeat(repeat: u32) -> Result<(), String> {
    if REPEAT_OPTIONS.contains(&repeat) {
        Ok(())
    } else {
        Err(format!("repeat must be one of {REPEAT_OPTIONS:?}, got {repeat}"))
    }
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|error| format!("{field} must be YYYY-MM-DD: {error}"))
}
