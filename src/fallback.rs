//! Synthetic series used when no fetched data is available
//!
//! The hourly series follows a sinusoidal solar curve that peaks at noon and
//! is zero through the night. The daily series covers the 30 days ending on
//! the given date with mildly randomized duration and temperature.

use std::f64::consts::PI;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::Rng;

use crate::data::{day_label, hour_label, DailyPoint, HourlyPoint, DAILY_WINDOW, HOURS_PER_DAY};

/// Peak sunshine minutes per hour in the synthetic curve
const PEAK_HOURLY_DURATION: f64 = 50.0;

/// Peak UV index in the synthetic curve
const PEAK_UV_INDEX: f64 = 10.0;

/// Relative solar intensity for an hour of the day, in `[0, 1]`
pub fn solar_intensity(hour: u32) -> f64 {
    ((f64::from(hour) - 6.0) * PI / 12.0).sin().max(0.0)
}

/// Generates 24 synthetic hourly points for `date`
pub fn fallback_hourly(date: NaiveDate) -> Vec<HourlyPoint> {
    (0..HOURS_PER_DAY as u32)
        .map(|hour| {
            let intensity = solar_intensity(hour);
            HourlyPoint {
                time: hour_label(hour),
                duration: intensity * PEAK_HOURLY_DURATION,
                uv_index: intensity * PEAK_UV_INDEX,
                timestamp: start_of_hour(date, hour),
            }
        })
        .collect()
}

/// Generates 30 synthetic daily points ending on `today`
pub fn fallback_daily(today: NaiveDate) -> Vec<DailyPoint> {
    fallback_daily_with_rng(today, &mut rand::thread_rng())
}

/// Same as [`fallback_daily`] with a caller-supplied random source
pub fn fallback_daily_with_rng<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<DailyPoint> {
    (0..DAILY_WINDOW as i64)
        .map(|i| {
            let date = today - Duration::days(DAILY_WINDOW as i64 - 1 - i);
            DailyPoint {
                date: day_label(date),
                duration: 300.0 + rng.gen::<f64>() * 200.0,
                avg_temperature: 15.0 + rng.gen::<f64>() * 10.0,
                timestamp: start_of_hour(date, 0),
            }
        })
        .collect()
}

pub(crate) fn start_of_hour(date: NaiveDate, hour: u32) -> chrono::DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(time))
}
