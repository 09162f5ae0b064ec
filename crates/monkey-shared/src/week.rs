//! Weekly scoring window.
//!
//! A week starts on Monday at 00:00 local time; Sunday is the seventh day of
//! the week that began six days earlier.  The window runs from that instant
//! up to "now" and is recomputed on every call.

use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveTime, Offset, TimeZone, Utc};

/// Start of the week containing `now`, in `now`'s time zone.
pub fn week_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let today = now.date_naive();
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let midnight = monday.and_time(NaiveTime::MIN);

    match now.timezone().from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Midnight skipped by a DST jump: shift by the offset in effect now.
        LocalResult::None => {
            let offset = i64::from(now.offset().fix().local_minus_utc());
            now.timezone()
                .from_utc_datetime(&(midnight - Duration::seconds(offset)))
        }
    }
}

/// Start of the current week in the server's local time zone, as UTC.
pub fn current_week_start() -> DateTime<Utc> {
    week_start(&Local::now()).with_timezone(&Utc)
}
