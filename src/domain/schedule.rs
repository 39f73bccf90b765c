use crate::domain::models::ScheduledWatering;
use crate::infrastructure::error::InfraError;
use chrono::{Days, NaiveDate};

/// Projects `repeat` watering dates, the `i`-th one `interval * i` days after `start_date`.
pub fn compute(
    start_date: NaiveDate,
    interval: u32,
    repeat: u32,
) -> Result<Vec<ScheduledWatering>, InfraError> {
    (1..=repeat)
        .map(|index| {
            let offset = u64::from(interval) * u64::from(index);
            start_date
                .checked_add_days(Days::new(offset))
                .map(|date| ScheduledWatering { index, date })
                .ok_or_else(|| {
                    InfraError::DateOutOfRange(format!(
                        "{start_date} + {offset} days is not a representable date"
                    ))
                })
        })
        .collect()
}
