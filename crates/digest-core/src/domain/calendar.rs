//! Calendar math for the daily run.
//!
//! "Local time" is the configured time zone, not the host's. All functions
//! take the current instant explicitly so they can be tested with a fixed clock.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Display format used in the subject and in the email body.
pub const DAY_FORMAT: &str = "%d/%m/%Y";

/// The day a run reports on: start of the current local day, minus one day.
pub fn target_day(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    let today = now.with_timezone(&tz).date_naive();
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

/// Next run: start of tomorrow (local) plus `hour` hours.
pub fn next_run_at(now: DateTime<Utc>, tz: Tz, hour: u32) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    local_time_on(tomorrow, tz, hour)
}

/// Startup registration time: today (local) at `hour`, possibly already past.
pub fn first_run_at(now: DateTime<Utc>, tz: Tz, hour: u32) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();
    local_time_on(today, tz, hour)
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// `day` at `hour`:00 local, as UTC.
///
/// On a DST gap the wall-clock time does not exist; the hour is added to local
/// midnight instead, which lands just after the gap.
fn local_time_on(day: NaiveDate, tz: Tz, hour: u32) -> DateTime<Utc> {
    let hour = hour.min(23);
    let wall = day.and_time(NaiveTime::MIN) + chrono::Duration::hours(i64::from(hour));
    match tz.from_local_datetime(&wall).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => {
            let midnight = tz
                .from_local_datetime(&day.and_time(NaiveTime::MIN))
                .earliest()
                .map(|m| m.with_timezone(&Utc))
                .unwrap_or_else(|| wall.and_utc());
            midnight + chrono::Duration::hours(i64::from(hour))
        }
    }
}
